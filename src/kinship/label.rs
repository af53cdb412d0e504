//! Kinship label resolution.
//!
//! Computes a human-readable relationship label between a viewer and a
//! target using a two-sided ancestor search:
//!
//! 1. Identity ("Me") and direct partner edges resolve immediately.
//! 2. The viewer's full ancestor set is expanded via parent edges, recording
//!    the hop distance to each ancestor.
//! 3. The target's ancestors are expanded breadth-first, stopping at the
//!    first node already present in the viewer's set. That lowest common
//!    ancestor yields the blood distance pair `(up, down)`.
//! 4. A fixed table maps `(up, down)` to a label, with "Great-" chains for
//!    direct lines.
//! 5. Failing a blood path, a single in-law hop is tried through either
//!    side's partner; anything further falls back to the person's role label
//!    or "Member".
//!
//! The search is lazy (run per query) and deterministic: frontiers expand in
//! edge insertion order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::KinshipError;
use crate::graph::{KinshipEngine, PersonId, RelKind};

/// Label for any pair the resolver cannot classify.
pub const FALLBACK_LABEL: &str = "Member";

/// Resolve the relationship label of `target` as seen by `viewer`.
///
/// Never fails on an unclassifiable pair; the only errors are unknown uids.
pub fn resolve(
    engine: &KinshipEngine,
    viewer: &PersonId,
    target: &PersonId,
) -> Result<String, KinshipError> {
    if engine.person(viewer).is_none() {
        return Err(KinshipError::UnknownPerson(viewer.clone()));
    }
    let target_person = engine
        .person(target)
        .ok_or_else(|| KinshipError::UnknownPerson(target.clone()))?;

    if viewer == target {
        return Ok("Me".to_string());
    }
    if engine.relationship_between(viewer, target) == Some(RelKind::Partner) {
        return Ok("Partner".to_string());
    }

    if let Some((up, down)) = blood_distance(engine, viewer, target) {
        return Ok(blood_label(up, down));
    }

    // One in-law hop through the target's partner: the viewer's blood
    // relative married the target.
    for partner in engine.partners_of(target) {
        if partner == *viewer {
            continue;
        }
        if let Some((up, down)) = blood_distance(engine, viewer, &partner) {
            return Ok(format!("{}-in-Law", blood_label(up, down)));
        }
    }

    // One in-law hop through the viewer's partner: the target is a blood
    // relative of the viewer's partner.
    for partner in engine.partners_of(viewer) {
        if partner == *target {
            continue;
        }
        if let Some((up, down)) = blood_distance(engine, &partner, target) {
            return Ok(format!("{}-in-Law", blood_label(up, down)));
        }
    }

    // Partner-of-partner and multi-hop in-law chains are deliberately left
    // unresolved; the role label (or "Member") is the defined fallback.
    Ok(target_person
        .role
        .clone()
        .filter(|role| !role.is_empty())
        .unwrap_or_else(|| FALLBACK_LABEL.to_string()))
}

/// Blood distance `(up, down)`: hops from viewer and target to their lowest
/// common ancestor via parent edges only. `None` when no common ancestor
/// exists.
pub fn blood_distance(
    engine: &KinshipEngine,
    viewer: &PersonId,
    target: &PersonId,
) -> Option<(u32, u32)> {
    // Full ancestor map of the viewer: ancestor uid -> up distance.
    let mut up_map: HashMap<PersonId, u32> = HashMap::new();
    let mut queue: VecDeque<(PersonId, u32)> = VecDeque::new();
    up_map.insert(viewer.clone(), 0);
    queue.push_back((viewer.clone(), 0));
    while let Some((uid, distance)) = queue.pop_front() {
        for parent in engine.parents_of(&uid) {
            if !up_map.contains_key(&parent) {
                up_map.insert(parent.clone(), distance + 1);
                queue.push_back((parent, distance + 1));
            }
        }
    }

    // Lazy expansion of the target's ancestors: the first frontier node
    // already in the viewer's map is the lowest common ancestor.
    let mut seen: HashSet<PersonId> = HashSet::new();
    let mut frontier: VecDeque<(PersonId, u32)> = VecDeque::new();
    seen.insert(target.clone());
    frontier.push_back((target.clone(), 0));
    while let Some((uid, down)) = frontier.pop_front() {
        if let Some(&up) = up_map.get(&uid) {
            return Some((up, down));
        }
        for parent in engine.parents_of(&uid) {
            if seen.insert(parent.clone()) {
                frontier.push_back((parent, down + 1));
            }
        }
    }
    None
}

/// Fixed (up, down) to label table. Cousins carry no degree distinction.
fn blood_label(up: u32, down: u32) -> String {
    match (up, down) {
        (0, 0) => "Me".to_string(),
        (1, 0) => "Parent".to_string(),
        (0, 1) => "Child".to_string(),
        (1, 1) => "Sibling".to_string(),
        (u, 0) => format!("{}Grandparent", "Great-".repeat(u as usize - 2)),
        (0, d) => format!("{}Grandchild", "Great-".repeat(d as usize - 2)),
        (2, 1) => "Aunt/Uncle".to_string(),
        (_, 1) => "Great-Aunt/Uncle".to_string(),
        (1, 2) => "Niece/Nephew".to_string(),
        (1, _) => "Great-Niece/Nephew".to_string(),
        _ => "Cousin".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Person;

    const T: &str = "2024-01-01T00:00:00Z";

    /// Three generations: gran -> (dad, uncle), dad+mom partners,
    /// dad -> (me, sis), uncle -> cousin.
    fn family() -> KinshipEngine {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("gran", "Gran")).unwrap();
        engine.place(Person::new("dad", "Dad"), Some(&"gran".into()), RelKind::Child, T).unwrap();
        engine.place(Person::new("uncle", "Uncle"), Some(&"dad".into()), RelKind::Sibling, T).unwrap();
        engine.place(Person::new("mom", "Mom"), Some(&"dad".into()), RelKind::Partner, T).unwrap();
        engine.place(Person::new("me", "Me"), Some(&"dad".into()), RelKind::Child, T).unwrap();
        engine.place(Person::new("sis", "Sis"), Some(&"me".into()), RelKind::Sibling, T).unwrap();
        engine.place(Person::new("cousin", "Cousin"), Some(&"uncle".into()), RelKind::Child, T).unwrap();
        engine
    }

    fn label(engine: &KinshipEngine, v: &str, t: &str) -> String {
        resolve(engine, &v.into(), &t.into()).unwrap()
    }

    #[test]
    fn test_me_and_partner() {
        let engine = family();
        assert_eq!(label(&engine, "me", "me"), "Me");
        assert_eq!(label(&engine, "dad", "mom"), "Partner");
        assert_eq!(label(&engine, "mom", "dad"), "Partner");
    }

    #[test]
    fn test_direct_line_labels() {
        let engine = family();
        assert_eq!(label(&engine, "me", "dad"), "Parent");
        assert_eq!(label(&engine, "dad", "me"), "Child");
        assert_eq!(label(&engine, "me", "gran"), "Grandparent");
        assert_eq!(label(&engine, "gran", "me"), "Grandchild");
    }

    #[test]
    fn test_great_chains() {
        let mut engine = family();
        engine.place(Person::new("kid", "Kid"), Some(&"me".into()), RelKind::Child, T).unwrap();

        assert_eq!(label(&engine, "kid", "gran"), "Great-Grandparent");
        assert_eq!(label(&engine, "gran", "kid"), "Great-Grandchild");
        assert_eq!(label(&engine, "kid", "uncle"), "Great-Aunt/Uncle");
        assert_eq!(label(&engine, "uncle", "kid"), "Great-Niece/Nephew");
    }

    #[test]
    fn test_collateral_labels() {
        let engine = family();
        assert_eq!(label(&engine, "me", "sis"), "Sibling");
        assert_eq!(label(&engine, "me", "uncle"), "Aunt/Uncle");
        assert_eq!(label(&engine, "uncle", "me"), "Niece/Nephew");
        assert_eq!(label(&engine, "me", "cousin"), "Cousin");
        assert_eq!(label(&engine, "cousin", "me"), "Cousin");
    }

    #[test]
    fn test_blood_label_symmetry() {
        let engine = family();
        let pairs = [
            ("me", "dad", "Parent", "Child"),
            ("me", "gran", "Grandparent", "Grandchild"),
            ("me", "uncle", "Aunt/Uncle", "Niece/Nephew"),
            ("me", "sis", "Sibling", "Sibling"),
        ];
        for (v, t, forward, inverse) in pairs {
            assert_eq!(label(&engine, v, t), forward);
            assert_eq!(label(&engine, t, v), inverse);
        }
    }

    #[test]
    fn test_in_law_through_target_partner() {
        let mut engine = family();
        // Sis marries "beau": from me, beau is my sibling's partner.
        engine.place(Person::new("beau", "Beau"), Some(&"sis".into()), RelKind::Partner, T).unwrap();

        assert_eq!(label(&engine, "me", "beau"), "Sibling-in-Law");
        assert_eq!(label(&engine, "gran", "beau"), "Grandchild-in-Law");
    }

    #[test]
    fn test_in_law_through_viewer_partner() {
        let mut engine = family();
        engine.place(Person::new("beau", "Beau"), Some(&"sis".into()), RelKind::Partner, T).unwrap();

        // From beau, sis's father is a parent-in-law.
        assert_eq!(label(&engine, "beau", "dad"), "Parent-in-Law");
        assert_eq!(label(&engine, "beau", "me"), "Sibling-in-Law");
    }

    #[test]
    fn test_shared_child_resolves_blood_before_in_law() {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("a", "A")).unwrap();
        engine.place(Person::new("b", "B"), Some(&"a".into()), RelKind::Partner, T).unwrap();
        engine.place(Person::new("c", "C"), Some(&"a".into()), RelKind::Child, T).unwrap();

        // Only A is C's parent: B reaches C through the in-law path.
        assert_eq!(label(&engine, "b", "c"), "Child-in-Law");

        // Once B is also C's parent, the direct blood label wins.
        engine.add_relationship(&"c".into(), &"b".into(), RelKind::Parent, T).unwrap();
        assert_eq!(label(&engine, "b", "c"), "Child");
        assert_eq!(label(&engine, "c", "b"), "Parent");
    }

    #[test]
    fn test_partner_of_partner_stays_unresolved() {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("a", "A")).unwrap();
        engine.place(Person::new("b", "B"), Some(&"a".into()), RelKind::Partner, T).unwrap();
        // Second partner edge on b, unrelated to a by blood.
        engine.add_person(Person::new("x", "X")).unwrap();
        engine.add_relationship(&"b".into(), &"x".into(), RelKind::Partner, T).unwrap();

        assert_eq!(label(&engine, "a", "x"), FALLBACK_LABEL);
    }

    #[test]
    fn test_fallback_prefers_role() {
        let mut engine = KinshipEngine::new();
        engine.add_person(Person::new("a", "A")).unwrap();
        engine.add_person(Person::new("helper", "H").with_role("Caregiver")).unwrap();

        assert_eq!(label(&engine, "a", "helper"), "Caregiver");
        assert_eq!(label(&engine, "helper", "a"), FALLBACK_LABEL);
    }

    #[test]
    fn test_unknown_person_is_an_error() {
        let engine = family();
        assert!(matches!(
            resolve(&engine, &"me".into(), &"ghost".into()),
            Err(KinshipError::UnknownPerson(_))
        ));
        assert!(matches!(
            resolve(&engine, &"ghost".into(), &"me".into()),
            Err(KinshipError::UnknownPerson(_))
        ));
    }

    #[test]
    fn test_blood_distance_pairs() {
        let engine = family();
        let dist = |v: &str, t: &str| blood_distance(&engine, &v.into(), &t.into());
        assert_eq!(dist("me", "me"), Some((0, 0)));
        assert_eq!(dist("me", "gran"), Some((2, 0)));
        assert_eq!(dist("gran", "me"), Some((0, 2)));
        assert_eq!(dist("me", "cousin"), Some((2, 2)));
        assert_eq!(dist("me", "mom"), None);
    }
}
