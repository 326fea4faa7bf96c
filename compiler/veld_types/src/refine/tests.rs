#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use crate::{Idx, ParamAttrs, Pool, RefineError, Tag};

#[test]
fn refining_updates_containers_in_place() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let st = pool.structure(&[opaque], false).unwrap();
    assert!(pool.is_abstract(st));

    pool.refine_abstract_type_to(opaque, Idx::I32).unwrap();

    assert!(!pool.is_abstract(st));
    assert_eq!(pool.struct_field(st, 0), Idx::I32);
    assert!(pool.is_forwarded(opaque));
}

#[test]
fn refining_an_unwatched_placeholder() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    pool.refine_abstract_type_to(opaque, Idx::I64).unwrap();
    assert_eq!(pool.resolve(opaque), Idx::I64);
}

#[test]
fn protocol_violations_are_checked() {
    let mut pool = Pool::new();

    // Only placeholders may undergo identity-changing refinement.
    assert_eq!(
        pool.refine_abstract_type_to(Idx::I32, Idx::I64),
        Err(RefineError::NotAPlaceholder {
            idx: Idx::I32,
            tag: Tag::Integer
        })
    );
    let st = pool.structure(&[Idx::I32], false).unwrap();
    assert!(matches!(
        pool.refine_abstract_type_to(st, Idx::I64),
        Err(RefineError::NotAPlaceholder { .. })
    ));

    // Never to itself.
    let opaque = pool.opaque();
    assert_eq!(
        pool.refine_abstract_type_to(opaque, opaque),
        Err(RefineError::SelfRefinement { placeholder: opaque })
    );

    // Never twice.
    pool.refine_abstract_type_to(opaque, Idx::I32).unwrap();
    assert_eq!(
        pool.refine_abstract_type_to(opaque, Idx::I64),
        Err(RefineError::AlreadyResolved { placeholder: opaque })
    );
}

#[test]
fn refining_to_another_placeholder() {
    let mut pool = Pool::new();

    let o1 = pool.opaque();
    let o2 = pool.opaque();
    let st = pool.structure(&[o1], false).unwrap();

    // The container follows the placeholder chain and stays abstract.
    pool.refine_abstract_type_to(o1, o2).unwrap();
    assert!(pool.is_abstract(st));
    assert_eq!(pool.struct_field(st, 0), o2);

    // Resolving the second placeholder completes the shape.
    pool.refine_abstract_type_to(o2, Idx::I8).unwrap();
    assert!(!pool.is_abstract(st));
    assert_eq!(pool.struct_field(st, 0), Idx::I8);

    // Stale handles to the first placeholder chase through to the end.
    assert_eq!(pool.resolve(o1), Idx::I8);
    assert_eq!(pool.resolve_readonly(o1), Idx::I8);
}

#[test]
fn self_referential_struct_becomes_concrete() {
    let mut pool = Pool::new();

    // struct S { S* }, built through a placeholder.
    let opaque = pool.opaque();
    let ptr = pool.pointer(opaque).unwrap();
    let st = pool.structure(&[ptr], false).unwrap();
    assert!(pool.is_abstract(ptr));
    assert!(pool.is_abstract(st));

    pool.refine_abstract_type_to(opaque, st).unwrap();

    // The cycle lost its placeholder; both members are concrete.
    assert!(!pool.is_abstract(st));
    assert!(!pool.is_abstract(ptr));
    assert_eq!(pool.struct_field(st, 0), ptr);
    assert_eq!(pool.element_type(ptr), st);

    // Both are canonical now: rebuilding the shapes finds them.
    assert_eq!(pool.pointer(st).unwrap(), ptr);
    assert_eq!(pool.structure(&[ptr], false).unwrap(), st);
}

#[test]
fn mutually_recursive_structs_become_concrete() {
    let mut pool = Pool::new();

    // struct A { B* }  /  struct B { A* }
    let oa = pool.opaque();
    let ob = pool.opaque();
    let ptr_a = pool.pointer(oa).unwrap();
    let ptr_b = pool.pointer(ob).unwrap();
    let a = pool.structure(&[ptr_b], false).unwrap();
    let b = pool.structure(&[ptr_a], false).unwrap();

    pool.refine_abstract_type_to(oa, a).unwrap();
    // B still waits on its own placeholder.
    assert!(pool.is_abstract(a));
    assert!(pool.is_abstract(b));

    pool.refine_abstract_type_to(ob, b).unwrap();
    assert!(!pool.is_abstract(a));
    assert!(!pool.is_abstract(b));
    assert_eq!(pool.element_type(pool.struct_field(a, 0)), b);
    assert_eq!(pool.element_type(pool.struct_field(b, 0)), a);
}

#[test]
fn independent_duplicates_collapse() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let s1 = pool.structure(&[opaque, Idx::I8], false).unwrap();
    let s2 = pool.structure(&[opaque, Idx::I8], false).unwrap();
    assert_ne!(s1, s2);

    // An edge that points at the duplicate-to-be.
    let ptr = pool.pointer(s2).unwrap();

    pool.refine_abstract_type_to(opaque, Idx::I32).unwrap();

    // One survivor; the duplicate forwards to it.
    assert!(!pool.is_abstract(s1));
    assert!(pool.is_forwarded(s2));
    assert_eq!(pool.resolve(s2), s1);

    // Every edge that pointed at the duplicate now points at the survivor.
    assert_eq!(pool.element_type(ptr), s1);
    assert_eq!(pool.structure(&[Idx::I32, Idx::I8], false).unwrap(), s1);
}

#[test]
fn collapse_into_pre_existing_concrete_type() {
    let mut pool = Pool::new();

    // The concrete shape exists first.
    let concrete = pool.structure(&[Idx::I32], false).unwrap();

    let opaque = pool.opaque();
    let abstract_twin = pool.structure(&[opaque], false).unwrap();
    let ptr = pool.pointer(abstract_twin).unwrap();

    pool.refine_abstract_type_to(opaque, Idx::I32).unwrap();

    // The just-completed node is discarded in favor of the canonical one.
    assert!(pool.is_forwarded(abstract_twin));
    assert_eq!(pool.resolve(abstract_twin), concrete);
    assert_eq!(pool.element_type(ptr), concrete);
    assert!(!pool.is_abstract(ptr));
}

#[test]
fn collapse_cascades_up_the_containment_graph() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let s1 = pool.structure(&[opaque], false).unwrap();
    let s2 = pool.structure(&[opaque], false).unwrap();
    let outer1 = pool.structure(&[s1], true).unwrap();
    let outer2 = pool.structure(&[s2], true).unwrap();
    assert_ne!(outer1, outer2);

    pool.refine_abstract_type_to(opaque, Idx::I16).unwrap();

    // The inner collapse rewrote outer2's field, making it a duplicate of
    // outer1, so the collapse cascaded one level up.
    assert!(pool.is_forwarded(s2));
    assert!(pool.is_forwarded(outer2));
    assert_eq!(pool.resolve(outer2), outer1);
    assert!(!pool.is_abstract(outer1));
    assert_eq!(pool.struct_field(outer1, 0), s1);
}

#[test]
fn cascade_through_nested_composites() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let arr = pool.array(opaque, 4).unwrap();
    let st = pool.structure(&[arr, Idx::FLOAT], false).unwrap();
    let f = pool.function(st, &[Idx::I32], false, &[]).unwrap();
    assert!(pool.is_abstract(f));

    pool.refine_abstract_type_to(opaque, Idx::I64).unwrap();

    assert!(!pool.is_abstract(arr));
    assert!(!pool.is_abstract(st));
    assert!(!pool.is_abstract(f));

    // Every promoted node is canonical for its final shape.
    assert_eq!(pool.array(Idx::I64, 4).unwrap(), arr);
    assert_eq!(pool.structure(&[arr, Idx::FLOAT], false).unwrap(), st);
    assert_eq!(pool.function(st, &[Idx::I32], false, &[]).unwrap(), f);
}

#[test]
fn distinct_shapes_stay_distinct_after_refinement() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let plain = pool.structure(&[opaque], false).unwrap();
    let packed = pool.structure(&[opaque], true).unwrap();

    pool.refine_abstract_type_to(opaque, Idx::I32).unwrap();

    // Packing still separates the shapes: no false collapse.
    assert!(!pool.is_forwarded(plain));
    assert!(!pool.is_forwarded(packed));
    assert_ne!(pool.resolve(plain), pool.resolve(packed));
}

#[test]
fn function_keys_survive_refinement() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let f1 = pool.function(Idx::I32, &[opaque], false, &[]).unwrap();
    let f2 = pool.function(Idx::I32, &[opaque], false, &[]).unwrap();
    let variadic = pool.function(Idx::I32, &[opaque], true, &[]).unwrap();
    let attrs = [ParamAttrs::empty(), ParamAttrs::ZEXT];
    let attributed = pool.function(Idx::I32, &[opaque], false, &attrs).unwrap();

    pool.refine_abstract_type_to(opaque, Idx::I8).unwrap();

    // Identical signatures collapse to one canonical instance.
    let survivor = pool.resolve(f2);
    assert_eq!(pool.resolve(f1), survivor);

    // Variadic flag and attribute bits keep signatures apart.
    assert_ne!(pool.resolve(variadic), survivor);
    assert_ne!(pool.resolve(attributed), survivor);
    let attributed = pool.resolve(attributed);
    assert!(pool.param_has_attr(attributed, 1, ParamAttrs::ZEXT));
    assert_eq!(pool.function_param(attributed, 0), Idx::I8);
}

#[test]
fn multiple_edges_to_one_placeholder() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let st = pool.structure(&[opaque, Idx::I1, opaque], false).unwrap();

    pool.refine_abstract_type_to(opaque, Idx::DOUBLE).unwrap();

    assert!(!pool.is_abstract(st));
    assert_eq!(pool.struct_fields(st), vec![Idx::DOUBLE, Idx::I1, Idx::DOUBLE]);
}

#[test]
fn duplicate_cycles_collapse_through_shared_placeholder() {
    let mut pool = Pool::new();

    // Two identical abstract structs over one placeholder; the refinement
    // target closes the cycle through the first.
    let opaque = pool.opaque();
    let ptr = pool.pointer(opaque).unwrap();
    let sa = pool.structure(&[ptr], false).unwrap();
    let sb = pool.structure(&[ptr], false).unwrap();

    pool.refine_abstract_type_to(opaque, sa).unwrap();

    // The cycle {sa, ptr} promoted; sb then completed as a duplicate of
    // sa and collapsed into it.
    assert!(!pool.is_abstract(sa));
    assert!(!pool.is_abstract(ptr));
    assert!(pool.is_forwarded(sb));
    assert_eq!(pool.resolve(sb), sa);
    assert_eq!(pool.element_type(ptr), sa);
}

#[test]
fn isomorphic_cycles_keep_their_identities() {
    let mut pool = Pool::new();

    // Build `struct S { S* }` twice, through independent placeholders.
    let build = |pool: &mut Pool| {
        let opaque = pool.opaque();
        let ptr = pool.pointer(opaque).unwrap();
        let st = pool.structure(&[ptr], false).unwrap();
        pool.refine_abstract_type_to(opaque, st).unwrap();
        st
    };
    let first = build(&mut pool);
    let second = build(&mut pool);

    // Structural keys compare components by identity, so two isomorphic
    // but independently-built cycles are distinct types.
    assert!(!pool.is_abstract(first));
    assert!(!pool.is_abstract(second));
    assert_ne!(first, second);
}

#[test]
fn stale_handles_resolve_at_construction_boundaries() {
    let mut pool = Pool::new();

    let opaque = pool.opaque();
    let st = pool.structure(&[opaque], false).unwrap();
    pool.refine_abstract_type_to(opaque, Idx::I32).unwrap();

    // Building with the dead placeholder handle is the same as building
    // with its survivor.
    let via_stale = pool.pointer(opaque).unwrap();
    let via_live = pool.pointer(Idx::I32).unwrap();
    assert_eq!(via_stale, via_live);

    let st_again = pool.structure(&[Idx::I32], false).unwrap();
    assert_eq!(st_again, st);
}
