//! Selective inclusion and exclusion of model elements.
//!
//! Runs after cross-reference. A [`Selection`] names fully-qualified IDs to
//! skip or to keep; [`apply`] prunes the top-level sequences, the nested
//! sequences of kept messages and the method lists of kept services. Pruned
//! nodes stay in the state, so every reference that resolved before the
//! filter still resolves after it. Elements only present for reference
//! resolution (dependencies) are never touched unless named.

use std::collections::BTreeSet;
use std::mem;

use tracing::{debug, warn};

use crate::config::{SourceOptions, split_list};
use crate::error::{Error, Result};
use crate::model::{Api, ApiState};

/// Which elements a filter pass keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Keep everything.
    #[default]
    All,
    /// Drop the named elements and their descendants.
    Skip(BTreeSet<String>),
    /// Keep the named elements, their descendants and their ancestors.
    Include(BTreeSet<String>),
}

impl Selection {
    /// Build a selection from comma-separated ID lists. Both lists present is
    /// a configuration error.
    pub fn new(skipped: Option<&str>, included: Option<&str>) -> Result<Self> {
        let skipped = skipped.map(split_list).filter(|ids| !ids.is_empty());
        let included = included.map(split_list).filter(|ids| !ids.is_empty());
        match (skipped, included) {
            (Some(_), Some(_)) => Err(Error::Configuration(
                "skipped-ids and included-ids are mutually exclusive".into(),
            )),
            (Some(ids), None) => Ok(Selection::Skip(ids.into_iter().collect())),
            (None, Some(ids)) => Ok(Selection::Include(ids.into_iter().collect())),
            (None, None) => Ok(Selection::All),
        }
    }

    /// Read `skipped-ids` and `included-ids` from the source options.
    pub fn from_options(options: &SourceOptions) -> Result<Self> {
        Self::new(
            options.get(SourceOptions::SKIPPED_IDS),
            options.get(SourceOptions::INCLUDED_IDS),
        )
    }

    fn named(&self) -> Option<&BTreeSet<String>> {
        match self {
            Selection::All => None,
            Selection::Skip(ids) | Selection::Include(ids) => Some(ids),
        }
    }
}

/// Outcome of a filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// IDs dropped from the model's sequences, including descendants of
    /// dropped nodes.
    pub removed: Vec<String>,
    /// Named IDs that match nothing in the model.
    pub stale_ids: Vec<String>,
}

/// Apply `selection` to `api`. Applying the same selection twice leaves the
/// model unchanged.
pub fn apply(api: &mut Api, selection: &Selection) -> FilterReport {
    let Some(named) = selection.named() else {
        return FilterReport::default();
    };

    let stale_ids: Vec<String> = named
        .iter()
        .filter(|id| !api.state.contains(id))
        .cloned()
        .collect();
    for id in &stale_ids {
        warn!(id = %id, "Filter names an element that does not exist; ignoring.");
    }

    let removed = match selection {
        Selection::Skip(ids) => prune(api, &|id: &str| !ids.contains(id)),
        Selection::Include(ids) => {
            let keep = included_closure(api, ids);
            prune(api, &|id: &str| keep.contains(id))
        }
        Selection::All => Vec::new(),
    };

    debug!(removed = removed.len(), stale = stale_ids.len(), "Applied element filter.");
    FilterReport { removed, stale_ids }
}

/// Everything that survives an include filter: named nodes, their whole
/// subtrees, and the ancestors of any survivor.
fn included_closure(api: &Api, named: &BTreeSet<String>) -> BTreeSet<String> {
    let mut keep = BTreeSet::new();
    for id in &api.messages {
        mark_message(&api.state, id, named, false, &mut keep);
    }
    for id in &api.enums {
        if named.contains(id) {
            keep.insert(id.clone());
        }
    }
    for id in &api.services {
        let Some(service) = api.state.service(id) else {
            continue;
        };
        let whole = named.contains(id);
        let methods: Vec<&String> = service
            .methods
            .iter()
            .filter(|m| whole || named.contains(*m))
            .collect();
        if whole || !methods.is_empty() {
            keep.insert(id.clone());
            keep.extend(methods.into_iter().cloned());
        }
    }
    keep
}

fn mark_message(
    state: &ApiState,
    id: &str,
    named: &BTreeSet<String>,
    inherited: bool,
    keep: &mut BTreeSet<String>,
) -> bool {
    let selected = inherited || named.contains(id);
    let mut survives = selected;
    if let Some(message) = state.message(id) {
        for child in &message.messages {
            survives |= mark_message(state, child, named, selected, keep);
        }
        for child in &message.enums {
            if selected || named.contains(child) {
                keep.insert(child.clone());
                survives = true;
            }
        }
    }
    if survives {
        keep.insert(id.to_string());
    }
    survives
}

fn prune(api: &mut Api, keep: &dyn Fn(&str) -> bool) -> Vec<String> {
    let mut removed = Vec::new();
    let state = &mut api.state;
    api.messages = prune_messages(state, mem::take(&mut api.messages), keep, &mut removed);
    api.enums = prune_leaves(state, mem::take(&mut api.enums), keep, &mut removed);

    let mut services = Vec::with_capacity(api.services.len());
    for id in mem::take(&mut api.services) {
        if !keep(&id) {
            record_removed(state, &id, &mut removed);
            continue;
        }
        if let Some(service) = state.service_by_id.get_mut(&id) {
            let methods = mem::take(&mut service.methods);
            let methods = prune_leaves(state, methods, keep, &mut removed);
            if let Some(service) = state.service_by_id.get_mut(&id) {
                service.methods = methods;
            }
        }
        services.push(id);
    }
    api.services = services;
    removed
}

fn prune_messages(
    state: &mut ApiState,
    ids: Vec<String>,
    keep: &dyn Fn(&str) -> bool,
    removed: &mut Vec<String>,
) -> Vec<String> {
    let mut kept = Vec::with_capacity(ids.len());
    for id in ids {
        if !keep(&id) {
            record_removed(state, &id, removed);
            continue;
        }
        if let Some(message) = state.message_by_id.get_mut(&id) {
            let nested = mem::take(&mut message.messages);
            let enums = mem::take(&mut message.enums);
            let nested = prune_messages(state, nested, keep, removed);
            let enums = prune_leaves(state, enums, keep, removed);
            if let Some(message) = state.message_by_id.get_mut(&id) {
                message.messages = nested;
                message.enums = enums;
            }
        }
        kept.push(id);
    }
    kept
}

/// Enums and methods have no children in the sequences.
fn prune_leaves(
    state: &ApiState,
    ids: Vec<String>,
    keep: &dyn Fn(&str) -> bool,
    removed: &mut Vec<String>,
) -> Vec<String> {
    let (kept, dropped): (Vec<_>, Vec<_>) = ids.into_iter().partition(|id| keep(id.as_str()));
    for id in dropped {
        record_removed(state, &id, removed);
    }
    kept
}

/// Report `id` and everything listed under it. The nodes stay in the state
/// so kept elements referencing them still resolve.
fn record_removed(state: &ApiState, id: &str, removed: &mut Vec<String>) {
    if let Some(message) = state.message(id) {
        removed.push(id.to_string());
        for child in message.messages.iter().chain(&message.enums) {
            record_removed(state, child, removed);
        }
    } else if let Some(service) = state.service(id) {
        removed.push(id.to_string());
        for method in &service.methods {
            record_removed(state, method, removed);
        }
    } else if state.contains(id) {
        removed.push(id.to_string());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{Enum, Message, Method, Service};

    // ========================================================================
    // Fixtures
    // ========================================================================

    fn api() -> Api {
        let mut api = Api::new("test", "test");
        let mut outer = Message::new(".test.Outer", "Outer", "test");
        outer.messages = vec![".test.Outer.A".into(), ".test.Outer.B".into()];
        outer.enums = vec![".test.Outer.Kind".into()];
        for message in [
            outer,
            Message::new(".test.Outer.A", "A", "test"),
            Message::new(".test.Outer.B", "B", "test"),
            Message::new(".test.Second", "Second", "test"),
            Message::new(".test.Third", "Third", "test"),
            Message::new(".dep.Dependency", "Dependency", "dep"),
        ] {
            api.state.insert_message(message).unwrap();
        }
        api.state
            .insert_enum(Enum::new(".test.Outer.Kind", "Kind", "test"))
            .unwrap();
        api.state
            .insert_enum(Enum::new(".test.Color", "Color", "test"))
            .unwrap();
        let mut service = Service::new(".test.Library", "Library", "test");
        for name in ["GetBook", "ListBooks", "DeleteBook"] {
            let method = Method::new(".test.Library", name);
            service.methods.push(method.id.clone());
            api.state.insert_method(method).unwrap();
        }
        api.state.insert_service(service).unwrap();

        api.messages = vec![".test.Outer".into(), ".test.Second".into(), ".test.Third".into()];
        api.enums = vec![".test.Color".into()];
        api.services = vec![".test.Library".into()];
        api
    }

    fn methods(api: &Api) -> Vec<&str> {
        api.state
            .service(".test.Library")
            .map(|s| s.methods.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    #[test]
    fn test_selection_is_exclusive() {
        let err = Selection::new(Some(".test.A"), Some(".test.B")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(Selection::new(None, Some(" ")).unwrap(), Selection::All);
    }

    // ========================================================================
    // Skip
    // ========================================================================

    #[test]
    fn test_skip_removes_exactly_named() {
        let mut api = api();
        let selection = Selection::new(Some(".test.Outer.A, .test.Library.ListBooks"), None).unwrap();
        let report = apply(&mut api, &selection);

        assert_eq!(report.removed, vec![".test.Outer.A", ".test.Library.ListBooks"]);
        assert!(report.stale_ids.is_empty());
        let outer = api.state.message(".test.Outer").unwrap();
        assert_eq!(outer.messages, vec![".test.Outer.B"]);
        // Pruned from the sequences only; references to it still resolve.
        assert!(api.state.message(".test.Outer.A").is_some());
        assert!(api.all_messages().iter().all(|m| m.id != ".test.Outer.A"));
        assert_eq!(api.services, vec![".test.Library"]);
        assert_eq!(
            methods(&api),
            vec![".test.Library.GetBook", ".test.Library.DeleteBook"]
        );
    }

    #[test]
    fn test_skip_removes_subtree() {
        let mut api = api();
        let report = apply(&mut api, &Selection::new(Some(".test.Outer"), None).unwrap());
        assert_eq!(api.messages, vec![".test.Second", ".test.Third"]);
        assert_eq!(
            report.removed,
            vec![".test.Outer", ".test.Outer.A", ".test.Outer.B", ".test.Outer.Kind"]
        );
        let generated: Vec<&str> = api.all_messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(generated, vec![".test.Second", ".test.Third"]);
        assert!(api.all_enums().iter().all(|e| e.id != ".test.Outer.Kind"));
        assert!(api.state.enum_(".test.Outer.Kind").is_some());
    }

    #[test]
    fn test_stale_ids_are_reported_not_fatal() {
        let mut api = api();
        let report = apply(&mut api, &Selection::new(Some(".test.Gone"), None).unwrap());
        assert_eq!(report.stale_ids, vec![".test.Gone"]);
        assert!(report.removed.is_empty());
        assert_eq!(api.messages.len(), 3);
    }

    // ========================================================================
    // Include
    // ========================================================================

    #[test]
    fn test_include_keeps_ancestors_and_order() {
        let mut api = api();
        let selection = Selection::new(
            None,
            Some(".test.Third, .test.Outer.B, .test.Library.DeleteBook, .test.Library.GetBook"),
        )
        .unwrap();
        apply(&mut api, &selection);

        assert_eq!(api.messages, vec![".test.Outer", ".test.Third"]);
        let outer = api.state.message(".test.Outer").unwrap();
        assert_eq!(outer.messages, vec![".test.Outer.B"]);
        assert!(outer.enums.is_empty());
        assert!(api.enums.is_empty());
        assert_eq!(
            methods(&api),
            vec![".test.Library.GetBook", ".test.Library.DeleteBook"]
        );
        // Dependencies stay resolvable.
        assert!(api.state.message(".dep.Dependency").is_some());
    }

    #[test]
    fn test_include_named_parent_keeps_subtree() {
        let mut api = api();
        apply(&mut api, &Selection::new(None, Some(".test.Outer")).unwrap());
        assert_eq!(api.messages, vec![".test.Outer"]);
        let outer = api.state.message(".test.Outer").unwrap();
        assert_eq!(outer.messages.len(), 2);
        assert_eq!(outer.enums.len(), 1);
        assert!(api.services.is_empty());
        assert!(api.state.method(".test.Library.GetBook").is_some());
    }

    #[test]
    fn test_filter_is_idempotent() {
        for selection in [
            Selection::new(Some(".test.Outer.A, .test.Color"), None).unwrap(),
            Selection::new(None, Some(".test.Outer.Kind, .test.Library.ListBooks")).unwrap(),
        ] {
            let mut once = api();
            apply(&mut once, &selection);
            let mut twice = once.clone();
            let report = apply(&mut twice, &selection);
            assert!(report.removed.is_empty());
            assert_eq!(once.messages, twice.messages);
            assert_eq!(once.enums, twice.enums);
            assert_eq!(methods(&once), methods(&twice));
            assert_eq!(
                once.state.message_by_id.keys().collect::<Vec<_>>(),
                twice.state.message_by_id.keys().collect::<Vec<_>>()
            );
        }
    }
}
