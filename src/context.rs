//! The `Context` owns all per-run simulation state.
//!
//! State is held in *data plugins*: each plugin is a zero-sized key type that names a data
//! container type. Modules define their own plugins with [`define_data_plugin!`] and expose
//! typed access through `Context*Ext` extension traits, so no module needs to know how the
//! others store their data.
//!
//! A `Context` is not shared between runs. Independent simulations each own their own
//! `Context` (and so their own random streams, population and contact network).
use std::any::{Any, TypeId};

use log::trace;

use crate::HashMap;

/// A simulated day. Day 0 is the initialization day.
pub type Day = u32;

/// A trait for objects that can provide data containers to be held by `Context`
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a new type for storing data in Context.
#[macro_export]
macro_rules! define_data_plugin {
    ($plugin:ident, $data_container:ty, $default: expr) => {
        #[derive(Copy, Clone)]
        struct $plugin;

        impl $crate::context::DataPlugin for $plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

pub struct Context {
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_day: Day,
    shutdown_requested: bool,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            data_plugins: HashMap::default(),
            current_day: 0,
            shutdown_requested: false,
        }
    }

    /// Returns a mutable reference to the data container for `T`, creating it with
    /// `T::create_data_container()` if it doesn't exist yet.
    #[allow(clippy::missing_panics_doc)]
    pub fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        self.data_plugins
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                trace!("creating data container for {}", std::any::type_name::<T>());
                Box::new(T::create_data_container())
            })
            .downcast_mut::<T::DataContainer>()
            // The entry was created from `T::DataContainer`, so the downcast cannot fail.
            .unwrap()
    }

    /// Returns a reference to the data container for `T`, or `None` if nothing has
    /// created it yet. Use [`Context::get_data_mut`] for lazy instantiation.
    #[must_use]
    pub fn get_data<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|data| data.downcast_ref::<T::DataContainer>())
    }

    /// Moves the container for `T` out of the context, leaving a fresh default in its place.
    /// Used when a step needs the container mutably while reading other plugins.
    pub fn take_data<T: DataPlugin>(&mut self, plugin: T) -> T::DataContainer {
        std::mem::replace(self.get_data_mut(plugin), T::create_data_container())
    }

    #[must_use]
    pub fn get_current_day(&self) -> Day {
        self.current_day
    }

    /// Moves the clock forward by one day and returns the new day.
    pub fn advance_day(&mut self) -> Day {
        self.current_day += 1;
        trace!("advancing to day {}", self.current_day);
        self.current_day
    }

    /// Requests that the simulation stop once the current day has completed.
    pub fn shutdown(&mut self) {
        trace!("shutdown requested on day {}", self.current_day);
        self.shutdown_requested = true;
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_data_plugin!(ComponentA, Vec<u32>, vec![]);
    define_data_plugin!(ComponentB, u32, 7);

    #[test]
    fn empty_context() {
        let context = Context::new();
        assert_eq!(context.get_current_day(), 0);
        assert!(!context.is_shutdown_requested());
        assert!(context.get_data(ComponentA).is_none());
    }

    #[test]
    fn data_plugin_created_lazily() {
        let mut context = Context::new();
        context.get_data_mut(ComponentA).push(1);
        context.get_data_mut(ComponentA).push(2);
        assert_eq!(context.get_data(ComponentA), Some(&vec![1, 2]));
        assert_eq!(*context.get_data_mut(ComponentB), 7);
    }

    #[test]
    fn take_data_leaves_default() {
        let mut context = Context::new();
        context.get_data_mut(ComponentA).push(3);
        let taken = context.take_data(ComponentA);
        assert_eq!(taken, vec![3]);
        assert_eq!(context.get_data(ComponentA), Some(&vec![]));
    }

    #[test]
    fn advance_and_shutdown() {
        let mut context = Context::new();
        assert_eq!(context.advance_day(), 1);
        assert_eq!(context.advance_day(), 2);
        context.shutdown();
        assert!(context.is_shutdown_requested());
        assert_eq!(context.get_current_day(), 2);
    }
}
