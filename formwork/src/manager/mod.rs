//! The value hosts manager.
//!
//! [`ValueHostsManager`] is the single source of truth for which value hosts
//! exist, their configurations and their instance state. Every add, update,
//! merge and discard fully tears down and recreates the live value host, so
//! callers holding a [`ValueHostRef`] to a replaced host get
//! [`Error::Disposed`] instead of stale data.
//!
//! # Ownership
//!
//! The manager owns its registry through an `Rc`. Value hosts and config
//! modifiers only hold a [`ManagerHandle`], a weak reference, so they never
//! extend the manager's lifetime. No registry borrow is held while value
//! hosts or notification handlers run, which lets handlers call back into
//! the manager.

mod accessor;
mod handle;
mod iter;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::builder::CompleteManagerConfig;
use crate::config::{ConfigMap, ManagerCallbacks, ManagerConfig, ValueHostConfig};
use crate::error::{Error, Result};
use crate::modifier::ManagerConfigModifier;
use crate::services::ValidationServices;
use crate::state::{ManagerInstanceState, ManagerStateSnapshot, ValueHostInstanceState};
use crate::value_host::{ValueHost, ValueHostRef};

pub use accessor::ValueHostAccessor;
pub use handle::ManagerHandle;
pub use iter::{ValueHostFilter, ValueHostIter};

const COMPONENT: &str = "ValueHostsManager";

/// Live registry state. `None` in [`ManagerCore::registry`] once disposed.
struct Registry {
    value_hosts: BTreeMap<String, Rc<dyn ValueHost>>,
    configs: Rc<RefCell<ConfigMap>>,
    last_instance_states: HashMap<String, ValueHostInstanceState>,
    instance_state: ManagerInstanceState,
    callbacks: ManagerCallbacks,
    suppress_config_changed: bool,
}

pub(crate) struct ManagerCore {
    me: Weak<ManagerCore>,
    services: Rc<ValidationServices>,
    registry: RefCell<Option<Registry>>,
}

impl ManagerCore {
    fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> Result<R> {
        self.registry
            .borrow()
            .as_ref()
            .map(f)
            .ok_or(Error::Disposed {
                component: COMPONENT,
            })
    }

    fn write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> Result<R> {
        self.registry
            .borrow_mut()
            .as_mut()
            .map(f)
            .ok_or(Error::Disposed {
                component: COMPONENT,
            })
    }

    fn is_disposed(&self) -> bool {
        self.registry.borrow().is_none()
    }

    fn handle(&self) -> ManagerHandle {
        ManagerHandle::new(self.me.clone())
    }

    pub(crate) fn services(&self) -> Result<Rc<ValidationServices>> {
        self.read(|_| Rc::clone(&self.services))
    }

    fn callbacks(&self) -> Result<ManagerCallbacks> {
        self.read(|registry| registry.callbacks.clone())
    }

    fn host(&self, name: &str) -> Result<Option<Rc<dyn ValueHost>>> {
        self.read(|registry| registry.value_hosts.get(name).cloned())
    }

    fn require_host(&self, name: &str) -> Result<Rc<dyn ValueHost>> {
        self.host(name)?.ok_or_else(|| Error::ValueHostNotFound {
            name: name.to_string(),
        })
    }

    fn value_of(&self, name: &str) -> Result<Option<Value>> {
        self.require_host(name)?.value()
    }

    fn contains(&self, name: &str) -> Result<bool> {
        self.read(|registry| registry.value_hosts.contains_key(name))
    }

    fn add_value_host(
        &self,
        config: &ValueHostConfig,
        initial_state: Option<ValueHostInstanceState>,
    ) -> Result<Rc<dyn ValueHost>> {
        check_name(config)?;
        if self.contains(&config.name)? {
            return Err(Error::DuplicateValueHostName {
                name: config.name.clone(),
            });
        }
        self.apply_config(config, initial_state)
    }

    fn add_or_update_value_host(
        &self,
        config: &ValueHostConfig,
        initial_state: Option<ValueHostInstanceState>,
    ) -> Result<Rc<dyn ValueHost>> {
        check_name(config)?;
        self.apply_config(config, initial_state)
    }

    pub(crate) fn add_or_merge_value_host(
        &self,
        config: &ValueHostConfig,
        initial_state: Option<ValueHostInstanceState>,
    ) -> Result<Rc<dyn ValueHost>> {
        check_name(config)?;
        if !self.contains(&config.name)? {
            return self.apply_config(config, initial_state);
        }

        let existing: Vec<ValueHostConfig> =
            self.read(|registry| registry.configs.borrow().values().cloned().collect())?;
        let merger = self.services.config_merge_service();
        let index = merger.identify_value_host_conflict(config, &existing);
        debug_assert!(
            index.is_some(),
            "registered value host '{}' has no matching configuration",
            config.name
        );
        let Some(index) = index else {
            return Err(Error::Inconsistent {
                details: format!(
                    "value host '{}' is registered but the merge service found no configuration for it",
                    config.name
                ),
            });
        };

        let mut merged = existing[index].clone();
        merger.merge(config, &mut merged);
        self.apply_config(&merged, initial_state)
    }

    /// Builds a new live host for `config` and swaps it in.
    ///
    /// The replacement is created before the registry changes, so a failure
    /// leaves the old host in place.
    fn apply_config(
        &self,
        config: &ValueHostConfig,
        initial_state: Option<ValueHostInstanceState>,
    ) -> Result<Rc<dyn ValueHost>> {
        let config = config.clone();
        let name = config.name.clone();
        let factory = self.services.value_host_factory();
        let defaults = factory.create_instance_state(&config)?;

        let explicit = initial_state.is_some();
        let seed = match initial_state {
            Some(state) => Some(state),
            None => self.read(|registry| registry.last_instance_states.get(&name).cloned())?,
        };
        let state = match seed {
            Some(mut state) => {
                factory.clean_up_instance_state(&mut state, &config)?;
                state.merge_over(defaults)
            }
            None => defaults,
        };

        let host = factory.create(self.handle(), config.clone(), state.clone())?;
        let replaced = self.write(|registry| {
            if explicit {
                registry.last_instance_states.insert(name.clone(), state);
            }
            registry.configs.borrow_mut().insert(name.clone(), config);
            registry.value_hosts.insert(name.clone(), Rc::clone(&host))
        })?;

        if let Some(old) = replaced {
            old.dispose();
            log::debug!("Replaced value host '{name}'");
        } else {
            log::debug!("Added value host '{name}'");
        }
        self.notify_config_changed()?;
        Ok(host)
    }

    fn discard_value_host(&self, name: &str) -> Result<()> {
        let removed = self.write(|registry| {
            let host = registry.value_hosts.remove(name)?;
            registry.configs.borrow_mut().remove(name);
            registry.last_instance_states.remove(name);
            Some(host)
        })?;

        let Some(host) = removed else {
            return Ok(());
        };
        host.dispose();
        log::debug!("Discarded value host '{name}'");
        self.notify_config_changed()
    }

    fn notify_config_changed(&self) -> Result<()> {
        let pending = self.read(|registry| {
            if registry.suppress_config_changed {
                return None;
            }
            let handler = registry.callbacks.on_config_changed.clone()?;
            let configs: Vec<ValueHostConfig> = registry.configs.borrow().values().cloned().collect();
            Some((handler, configs))
        })?;
        if let Some((handler, configs)) = pending {
            handler(configs);
        }
        Ok(())
    }

    fn notify_value_host_instance_state_changed(
        &self,
        host: &dyn ValueHost,
        state: &ValueHostInstanceState,
    ) -> Result<()> {
        let (host_handler, manager_handler, instance_state) = self.write(|registry| {
            registry
                .last_instance_states
                .insert(state.name.clone(), state.clone());
            registry.instance_state.state_change_counter += 1;
            (
                registry.callbacks.on_value_host_instance_state_changed.clone(),
                registry.callbacks.on_instance_state_changed.clone(),
                registry.instance_state.clone(),
            )
        })?;
        if let Some(handler) = host_handler {
            handler(host, state);
        }
        if let Some(handler) = manager_handler {
            handler(&instance_state);
        }
        Ok(())
    }

    fn notify_other_value_hosts_of_value_change(&self, changed_name: &str, revalidate: bool) -> Result<()> {
        let others: Vec<Rc<dyn ValueHost>> = self.read(|registry| {
            registry
                .value_hosts
                .iter()
                .filter(|(name, _)| name.as_str() != changed_name)
                .map(|(_, host)| Rc::clone(host))
                .collect()
        })?;
        for host in others {
            if let Some(validatable) = host.as_validatable() {
                validatable.other_value_host_changed_notification(changed_name, revalidate)?;
            }
        }
        Ok(())
    }

    fn dispose(&self) {
        let registry = self.registry.borrow_mut().take();
        if let Some(registry) = registry {
            for host in registry.value_hosts.values() {
                host.dispose();
            }
            registry.configs.borrow_mut().clear();
            log::debug!("Disposed value hosts manager");
        }
    }
}

fn check_name(config: &ValueHostConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        return Err(Error::invalid_argument("name", "value host name must not be empty"));
    }
    Ok(())
}

/// The root object holding the live value host registry.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formwork::builder::DeclareValueHosts;
/// use formwork::services::{create_builder, ValidationServices};
/// use formwork::ValueHostsManager;
/// use serde_json::json;
///
/// let services = Rc::new(ValidationServices::new());
/// let mut builder = create_builder(&services);
/// builder.static_host("F1").unwrap();
/// builder.input(("email", "String")).unwrap();
///
/// let manager = ValueHostsManager::from_builder(builder).unwrap();
/// assert!(manager.get_value_host("F1").unwrap().is_some());
/// assert!(manager.get_value_host("missing").unwrap().is_none());
///
/// manager.dispose();
/// assert!(manager.get_value_host("F1").is_err());
/// ```
pub struct ValueHostsManager {
    core: Rc<ManagerCore>,
}

impl ValueHostsManager {
    /// Creates a manager from a configuration.
    ///
    /// Saved instance states are matched by name. Configuration-changed
    /// notifications are not fired for the initial value hosts.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no services are attached, or the
    /// first error raised while adding the configured value hosts.
    pub fn new(config: ManagerConfig) -> Result<Self> {
        let services = config.require_services()?;
        let ManagerConfig {
            value_host_configs,
            saved_instance_state,
            saved_value_host_instance_states,
            callbacks,
            ..
        } = config;

        let last_instance_states = saved_value_host_instance_states
            .into_iter()
            .map(|state| (state.name.clone(), state))
            .collect();
        let core = Rc::new_cyclic(|me| ManagerCore {
            me: me.clone(),
            services,
            registry: RefCell::new(Some(Registry {
                value_hosts: BTreeMap::new(),
                configs: Rc::new(RefCell::new(ConfigMap::new())),
                last_instance_states,
                instance_state: saved_instance_state.unwrap_or_default(),
                callbacks,
                suppress_config_changed: true,
            })),
        });

        for value_host_config in &value_host_configs {
            core.add_value_host(value_host_config, None)?;
        }
        core.write(|registry| registry.suppress_config_changed = false)?;
        log::debug!(
            "Created value hosts manager with {} value hosts",
            value_host_configs.len()
        );
        Ok(Self { core })
    }

    /// Completes a builder and creates a manager from the result.
    ///
    /// # Errors
    ///
    /// Returns the builder's completion error or any error from [`ValueHostsManager::new`].
    pub fn from_builder(builder: impl CompleteManagerConfig) -> Result<Self> {
        Self::new(builder.complete()?)
    }

    /// The shared services bag.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn services(&self) -> Result<Rc<ValidationServices>> {
        self.core.services()
    }

    /// A weak handle to this manager.
    #[must_use]
    pub fn handle(&self) -> ManagerHandle {
        self.core.handle()
    }

    /// Looks up a value host. Unknown names return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn get_value_host(&self, name: &str) -> Result<Option<ValueHostRef>> {
        Ok(self.core.host(name)?.as_ref().map(ValueHostRef::new))
    }

    /// A copy of a registered configuration. Unknown names return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn get_value_host_config(&self, name: &str) -> Result<Option<ValueHostConfig>> {
        self.core
            .read(|registry| registry.configs.borrow().get(name).cloned())
    }

    /// Copies of every registered configuration, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn value_host_configs(&self) -> Result<Vec<ValueHostConfig>> {
        self.core
            .read(|registry| registry.configs.borrow().values().cloned().collect())
    }

    /// Names of every registered value host, in order.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn value_host_names(&self) -> Result<Vec<String>> {
        self.core
            .read(|registry| registry.value_hosts.keys().cloned().collect())
    }

    /// Adds a value host.
    ///
    /// An explicit `initial_state` is remembered for the name.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateValueHostName` if the name is registered,
    /// `InvalidArgument` for an empty name, `NoValueHostGenerator` for an
    /// unsupported type, and `Disposed` after disposal.
    pub fn add_value_host(
        &self,
        config: &ValueHostConfig,
        initial_state: Option<ValueHostInstanceState>,
    ) -> Result<ValueHostRef> {
        Ok(ValueHostRef::new(&self.core.add_value_host(config, initial_state)?))
    }

    /// Adds a value host, or replaces an existing one with `config` verbatim.
    ///
    /// Without an explicit state, the replacement starts from the last known
    /// state of the name.
    ///
    /// # Errors
    ///
    /// See [`ValueHostsManager::add_value_host`], except that existing names
    /// are accepted.
    pub fn add_or_update_value_host(
        &self,
        config: &ValueHostConfig,
        initial_state: Option<ValueHostInstanceState>,
    ) -> Result<ValueHostRef> {
        Ok(ValueHostRef::new(
            &self.core.add_or_update_value_host(config, initial_state)?,
        ))
    }

    /// Adds a value host, or merges `config` into the existing configuration
    /// through the merge service and rebuilds the value host from the result.
    ///
    /// # Errors
    ///
    /// See [`ValueHostsManager::add_or_update_value_host`].
    pub fn add_or_merge_value_host(
        &self,
        config: &ValueHostConfig,
        initial_state: Option<ValueHostInstanceState>,
    ) -> Result<ValueHostRef> {
        Ok(ValueHostRef::new(
            &self.core.add_or_merge_value_host(config, initial_state)?,
        ))
    }

    /// Removes a value host, its configuration and its remembered state.
    /// Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn discard_value_host(&self, name: &str) -> Result<()> {
        self.core.discard_value_host(name)
    }

    /// Informs every validatable value host except `changed_name` that
    /// `changed_name` changed.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn notify_other_value_hosts_of_value_change(
        &self,
        changed_name: &str,
        revalidate: bool,
    ) -> Result<()> {
        self.core
            .notify_other_value_hosts_of_value_change(changed_name, revalidate)
    }

    /// Records `state` as the last known state of `host` and fires the
    /// instance state handlers.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn notify_value_host_instance_state_changed(
        &self,
        host: &dyn ValueHost,
        state: &ValueHostInstanceState,
    ) -> Result<()> {
        self.core
            .notify_value_host_instance_state_changed(host, state)
    }

    /// Lazily enumerates live value hosts in name order.
    ///
    /// Each step reads the registry as it is at that moment.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn enumerate_value_hosts(&self, filter: Option<ValueHostFilter>) -> Result<ValueHostIter> {
        self.core.read(|_| ())?;
        Ok(ValueHostIter::new(Rc::downgrade(&self.core), filter))
    }

    /// Type-checked lookups.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn vh(&self) -> Result<ValueHostAccessor<'_>> {
        self.core.read(|_| ())?;
        Ok(ValueHostAccessor::new(self))
    }

    /// The manager-level instance state.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn instance_state(&self) -> Result<ManagerInstanceState> {
        self.core.read(|registry| registry.instance_state.clone())
    }

    /// Changes the manager-level instance state and fires its handler.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn update_instance_state(&self, update: impl FnOnce(&mut ManagerInstanceState)) -> Result<()> {
        let (handler, state) = self.core.write(|registry| {
            update(&mut registry.instance_state);
            registry.instance_state.state_change_counter += 1;
            (
                registry.callbacks.on_instance_state_changed.clone(),
                registry.instance_state.clone(),
            )
        })?;
        if let Some(handler) = handler {
            handler(&state);
        }
        Ok(())
    }

    /// Captures the manager-level state and the state of every live value host.
    ///
    /// Feed it back through [`ManagerConfig::with_snapshot`] to rehydrate.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn snapshot(&self) -> Result<ManagerStateSnapshot> {
        let (instance_state, hosts) = self.core.read(|registry| {
            (
                registry.instance_state.clone(),
                registry.value_hosts.values().cloned().collect::<Vec<_>>(),
            )
        })?;
        let value_host_instance_states = hosts
            .iter()
            .map(|host| host.instance_state())
            .collect::<Result<Vec<_>>>()?;
        Ok(ManagerStateSnapshot {
            instance_state,
            value_host_instance_states,
        })
    }

    /// Starts staging configuration changes.
    ///
    /// The modifier reads the live configuration but changes nothing until
    /// [`ManagerConfigModifier::apply`] is called.
    ///
    /// # Errors
    ///
    /// Returns `Disposed` after disposal.
    pub fn start_modifying(&self) -> Result<ManagerConfigModifier> {
        let configs = self.core.read(|registry| Rc::downgrade(&registry.configs))?;
        Ok(self
            .core
            .services
            .modifier_factory()
            .create(self.handle(), configs))
    }

    /// Disposes every value host and releases the registry.
    /// Every later call fails with `Disposed`.
    pub fn dispose(&self) {
        self.core.dispose();
    }

    /// Returns whether [`ValueHostsManager::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }
}

impl Drop for ValueHostsManager {
    fn drop(&mut self) {
        self.core.dispose();
    }
}

impl std::fmt::Debug for ValueHostsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueHostsManager")
            .field("value_hosts", &self.value_host_names().unwrap_or_default())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
