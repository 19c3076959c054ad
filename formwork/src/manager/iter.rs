//! Lazy enumeration of live value hosts.

use std::ops::Bound;
use std::rc::{Rc, Weak};

use super::ManagerCore;
use crate::value_host::{ValueHost, ValueHostRef};

/// Predicate selecting value hosts during enumeration.
pub type ValueHostFilter = Box<dyn Fn(&dyn ValueHost) -> bool>;

/// Iterator over live value hosts, in name order.
///
/// Each call to `next` resumes after the last yielded name and reads the
/// registry as it is at that moment, so hosts added or discarded between
/// steps are seen or skipped accordingly. Enumeration ends when the
/// registry is exhausted or the manager is gone.
pub struct ValueHostIter {
    core: Weak<ManagerCore>,
    filter: Option<ValueHostFilter>,
    cursor: Option<String>,
    done: bool,
}

impl ValueHostIter {
    pub(super) fn new(core: Weak<ManagerCore>, filter: Option<ValueHostFilter>) -> Self {
        Self {
            core,
            filter,
            cursor: None,
            done: false,
        }
    }

    /// The next registered host after the cursor, without filtering.
    fn next_entry(&self) -> Option<(String, Rc<dyn ValueHost>)> {
        let core = self.core.upgrade()?;
        let registry = core.registry.borrow();
        let hosts = &registry.as_ref()?.value_hosts;
        let lower = match &self.cursor {
            Some(name) => Bound::Excluded(name.as_str()),
            None => Bound::Unbounded,
        };
        let entry = hosts
            .range::<str, _>((lower, Bound::Unbounded))
            .next()
            .map(|(name, host)| (name.clone(), Rc::clone(host)));
        entry
    }
}

impl Iterator for ValueHostIter {
    type Item = ValueHostRef;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some((name, host)) = self.next_entry() else {
                self.done = true;
                break;
            };
            self.cursor = Some(name);
            let selected = match &self.filter {
                Some(filter) => filter(host.as_ref()),
                None => true,
            };
            if selected {
                return Some(ValueHostRef::new(&host));
            }
        }
        None
    }
}

impl std::iter::FusedIterator for ValueHostIter {}

impl std::fmt::Debug for ValueHostIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueHostIter")
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
