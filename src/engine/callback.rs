//! Host function table used for engine-to-host calls during analysis.
//!
//! A function stays callable only while its [`Registration`] is alive; the
//! slot is cleared when the registration drops, whichever way the analysis
//! ends.

use super::primitives::{CallbackHandle, HostFunctions};
use log::{debug, warn};
use std::cell::RefCell;

pub(crate) struct CallbackTable<'f> {
    slots: RefCell<Vec<Option<&'f dyn Fn()>>>,
}

impl<'f> CallbackTable<'f> {
    pub(crate) fn new() -> Self {
        CallbackTable {
            slots: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn register<'t>(&'t self, function: &'f dyn Fn()) -> Registration<'t, 'f> {
        let mut slots = self.slots.borrow_mut();
        let index = match slots.iter().position(Option::is_none) {
            Some(free) => {
                slots[free] = Some(function);
                free
            }
            None => {
                slots.push(Some(function));
                slots.len() - 1
            }
        };
        let handle = CallbackHandle(index as u32);
        debug!("registered host function {handle:?}");
        Registration {
            table: self,
            handle,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self, handle: CallbackHandle) -> bool {
        matches!(self.slots.borrow().get(handle.0 as usize), Some(Some(_)))
    }
}

impl HostFunctions for CallbackTable<'_> {
    fn call(&self, handle: CallbackHandle) {
        // Copy the function out so the table is not borrowed during the call.
        let function = self.slots.borrow().get(handle.0 as usize).copied().flatten();
        match function {
            Some(function) => function(),
            None => warn!("engine called unregistered host function {handle:?}"),
        }
    }
}

pub(crate) struct Registration<'t, 'f> {
    table: &'t CallbackTable<'f>,
    handle: CallbackHandle,
}

impl Registration<'_, '_> {
    pub(crate) fn handle(&self) -> CallbackHandle {
        self.handle
    }
}

impl Drop for Registration<'_, '_> {
    fn drop(&mut self) {
        if let Some(slot) = self.table.slots.borrow_mut().get_mut(self.handle.0 as usize) {
            *slot = None;
        }
        debug!("removed host function {:?}", self.handle);
    }
}
