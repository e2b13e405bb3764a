//! Ordering of asynchronous image loads.
//!
//! Decodes may finish in any order. Each request takes a [`LoadTicket`] for
//! its `(name, version)` slot; a completion is applied only while its ticket
//! is still the newest one for every slot it overlaps, so the last request
//! wins rather than the last decode.

use std::collections::HashMap;

use crate::payload::Version;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    name: String,
    version: Version,
    serial: u64,
}

impl LoadTicket {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

#[derive(Debug, Default)]
pub struct LoadSequencer {
    next_serial: u64,
    latest: HashMap<(String, Version), u64>,
}

impl LoadSequencer {
    /// Record a new request for `(name, version)`, superseding older ones.
    pub fn begin(&mut self, name: &str, version: Version) -> LoadTicket {
        self.next_serial += 1;
        let serial = self.next_serial;
        self.latest.insert((name.to_string(), version), serial);
        LoadTicket {
            name: name.to_string(),
            version,
            serial,
        }
    }

    /// Whether no overlapping request was made after `ticket`.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.latest
            .iter()
            .filter(|((name, version), _)| {
                name == &ticket.name && version.overlaps(&ticket.version)
            })
            .all(|(_, &serial)| serial <= ticket.serial)
    }
}
