//! Command execution against a store
//!
//! PUTREF and GETREF read the value stored under the given key as the name of
//! a second key and act on that one. The indirection is a single hop: the
//! second key's value is never dereferenced again.

use crate::error::Result;
use crate::protocol::{Command, Response, Verb};
use crate::store::Store;

/// Apply a parsed command to `store`.
///
/// Lookup misses are reported as [`Response`] values. `Err` is only
/// returned when the store itself fails.
pub fn execute<S: Store + ?Sized>(store: &mut S, command: &Command) -> Result<Response> {
    match command.verb {
        Verb::Put => {
            store.put(command.key.clone(), command.value.clone())?;
            Ok(Response::Ok)
        }
        Verb::Delete => {
            store.delete(&command.key)?;
            Ok(Response::Ok)
        }
        Verb::PutRef => match resolve_reference(store, &command.key)? {
            Some((target, _)) => {
                store.put(target, command.value.clone())?;
                Ok(Response::Ok)
            }
            None => Ok(Response::NoRecordForReferenceKey),
        },
        Verb::Get => match store.get(&command.key)? {
            Some(value) => Ok(Response::Entry {
                key: command.key.clone(),
                value,
            }),
            None => Ok(Response::NoRecordForKey),
        },
        Verb::GetRef => match resolve_reference(store, &command.key)? {
            Some((key, value)) => Ok(Response::Entry { key, value }),
            None => Ok(Response::NoRecordForKey),
        },
        Verb::Quit => Ok(Response::Quit),
        Verb::Unknown => Ok(Response::Ok),
    }
}

/// Follow the value at `key` to the entry it names.
///
/// Returns the referenced key and its value, or `None` if either `key` or the
/// key it names is absent.
fn resolve_reference<S: Store + ?Sized>(store: &S, key: &str) -> Result<Option<(String, String)>> {
    let target = match store.get(key)? {
        Some(target) => target,
        None => return Ok(None),
    };
    Ok(store.get(&target)?.map(|value| (target, value)))
}
