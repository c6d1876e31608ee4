//! In-memory whitelist/blacklist of CIDR networks.
//!
//! A single reader-writer lock protects both lists; reads take a shared
//! lock, mutations take an exclusive one. List-store operations never touch
//! the network, so they never suspend.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::RwLock;

use ipnetwork::Ipv4Network;

use crate::cidr::{self, Containment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Whitelist,
    Blacklist,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ListStoreError {
    #[error("already covered by {0}")]
    AlreadyCovered(String),

    #[error("overlaps {0} in the other list")]
    CrossListOverlap(String),

    #[error("entry not present")]
    NotPresent,
}

/// Non-fatal detail returned alongside a successful insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddNote {
    None,
    /// A narrower peer in the same list was removed in favor of the new,
    /// broader entry. Carries the canonical text of the removed peer.
    OverlapCollapsed(String),
}

#[derive(Default)]
struct Lists {
    whitelist: HashMap<String, Ipv4Network>,
    blacklist: HashMap<String, Ipv4Network>,
}

impl Lists {
    fn get(&self, kind: ListKind) -> &HashMap<String, Ipv4Network> {
        match kind {
            ListKind::Whitelist => &self.whitelist,
            ListKind::Blacklist => &self.blacklist,
        }
    }

    fn get_mut(&mut self, kind: ListKind) -> &mut HashMap<String, Ipv4Network> {
        match kind {
            ListKind::Whitelist => &mut self.whitelist,
            ListKind::Blacklist => &mut self.blacklist,
        }
    }

    fn other(kind: ListKind) -> ListKind {
        match kind {
            ListKind::Whitelist => ListKind::Blacklist,
            ListKind::Blacklist => ListKind::Whitelist,
        }
    }
}

pub struct ListStore {
    lists: RwLock<Lists>,
}

impl Default for ListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ListStore {
    pub fn new() -> Self {
        Self {
            lists: RwLock::new(Lists::default()),
        }
    }

    fn contains_ip(list: &HashMap<String, Ipv4Network>, ip: Ipv4Addr) -> bool {
        let probe = Ipv4Network::new(ip, 32).expect("/32 is always valid");
        list.values()
            .any(|net| matches!(cidr::contains(*net, probe), Containment::AContainsB | Containment::Equal))
    }

    pub fn in_whitelist(&self, ip: Ipv4Addr) -> bool {
        let lists = self.lists.read().expect("list store lock poisoned");
        Self::contains_ip(&lists.whitelist, ip)
    }

    pub fn in_blacklist(&self, ip: Ipv4Addr) -> bool {
        let lists = self.lists.read().expect("list store lock poisoned");
        Self::contains_ip(&lists.blacklist, ip)
    }

    /// Insert `net` into `kind`. See module docs and the design ledger for
    /// the overlap-collapse and cross-list rules this implements.
    pub fn add(
        &self,
        kind: ListKind,
        net: Ipv4Network,
        force: bool,
    ) -> Result<AddNote, ListStoreError> {
        let mut lists = self.lists.write().expect("list store lock poisoned");

        let mut note = AddNote::None;

        // Step 1: scan the target list for the first overlapping peer only —
        // a second superset peer, if one exists, is left untouched.
        if let Some((existing_key, existing_net)) = lists
            .get(kind)
            .iter()
            .find(|(_, existing)| cidr::overlaps(**existing, net))
            .map(|(k, v)| (k.clone(), *v))
        {
            match cidr::contains(existing_net, net) {
                Containment::AContainsB | Containment::Equal => {
                    return Err(ListStoreError::AlreadyCovered(existing_key));
                }
                Containment::BContainsA | Containment::Neither => {
                    lists.get_mut(kind).remove(&existing_key);
                    note = AddNote::OverlapCollapsed(existing_key);
                }
            }
        }

        // Step 2: cross-list overlap check.
        let other_kind = Lists::other(kind);
        if let Some(other_key) = lists
            .get(other_kind)
            .iter()
            .find(|(_, other)| cidr::overlaps(**other, net))
            .map(|(k, _)| k.clone())
        {
            if !force {
                return Err(ListStoreError::CrossListOverlap(other_key));
            }
            // force = true: proceed without touching the other list's entry.
        }

        lists.get_mut(kind).insert(cidr::canonical_text(net), net);
        Ok(note)
    }

    /// Remove `net` by exact canonical key; no range matching.
    pub fn remove(&self, kind: ListKind, net: Ipv4Network) -> Result<(), ListStoreError> {
        let mut lists = self.lists.write().expect("list store lock poisoned");
        let key = cidr::canonical_text(net);
        if lists.get_mut(kind).remove(&key).is_some() {
            Ok(())
        } else {
            Err(ListStoreError::NotPresent)
        }
    }

    /// Consistent snapshots of both lists, taken under the read lock.
    pub fn enumerate(&self) -> (Vec<String>, Vec<String>) {
        let lists = self.lists.read().expect("list store lock poisoned");
        let mut whitelist: Vec<String> = lists.whitelist.keys().cloned().collect();
        let mut blacklist: Vec<String> = lists.blacklist.keys().cloned().collect();
        whitelist.sort();
        blacklist.sort();
        (whitelist, blacklist)
    }
}
