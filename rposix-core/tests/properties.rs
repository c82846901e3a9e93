//! Property tests over the pure parts of the binding.

use proptest::prelude::*;

use rposix_core::dispatch::Shape;
use rposix_core::native::process;
use rposix_core::{ArgKind, NativeBuffer, OperationRegistry, ProcessHost, Variant};

/// Pack a device id the way `major`/`minor` expect it.
fn encode(major: u32, minor: u32) -> i32 {
    ((major << 24) | minor) as i32
}

fn shape_of(v: &Variant) -> Option<Shape> {
    match v.kind() {
        ArgKind::Nil => Some(Shape::Nil),
        ArgKind::Int(_) => Some(Shape::Int),
        ArgKind::Str(_) => Some(Shape::Str),
        ArgKind::Symbol(_) => Some(Shape::Symbol),
        ArgKind::Pointer(_) => Some(Shape::Pointer),
        ArgKind::Opaque => None,
    }
}

fn any_variant() -> impl Strategy<Value = Variant> {
    prop_oneof![
        Just(Variant::Nil),
        any::<bool>().prop_map(Variant::Bool),
        any::<i64>().prop_map(Variant::Int),
        "[a-z]{0,8}".prop_map(Variant::Str),
        "[A-Z]{1,8}".prop_map(Variant::Symbol),
    ]
}

proptest! {
    /// Device ids split back into the parts they were packed from.
    #[test]
    fn prop_device_numbers_invert_encode(major in 0u32..=255, minor in 0u32..(1 << 24)) {
        let dev = encode(major, minor);
        prop_assert_eq!(process::major(dev), major as i32);
        prop_assert_eq!(process::minor(dev), minor as i32);
    }

    /// The registry operations agree with the native split.
    #[test]
    fn prop_registry_device_numbers(major in 0u32..=255, minor in 0u32..(1 << 24)) {
        let dev = Variant::Int(encode(major, minor) as i64);
        let mut host = ProcessHost::with_directory("/");
        let registry = OperationRegistry::global();
        prop_assert_eq!(
            registry.call(&mut host, "major", &[dev.clone()]).unwrap(),
            Variant::Int(major as i64)
        );
        prop_assert_eq!(
            registry.call(&mut host, "minor", &[dev]).unwrap(),
            Variant::Int(minor as i64)
        );
    }

    /// `memset` touches exactly the requested prefix.
    #[test]
    fn prop_memset_fills_prefix(cap in 1usize..256, byte in any::<u8>(), len in 0usize..256) {
        let buf = NativeBuffer::new(cap);
        let mut host = ProcessHost::with_directory("/");
        let r = OperationRegistry::global().call(
            &mut host,
            "memset",
            &[buf.pointer().into(), Variant::Int(byte as i64), Variant::Int(len as i64)],
        );
        if len <= cap {
            prop_assert_eq!(r.unwrap(), Variant::Pointer(buf.pointer()));
            let contents = buf.to_vec();
            prop_assert!(contents[..len].iter().all(|&b| b == byte));
            prop_assert!(contents[len..].iter().all(|&b| b == 0));
        } else {
            prop_assert!(r.unwrap_err().is_binding_misuse());
        }
    }

    /// Any shape is accepted by `Any` and by its own shape only.
    #[test]
    fn prop_shapes_accept_their_own_kind(v in any_variant()) {
        prop_assert!(Shape::Any.accepts(v.kind()));
        let all = [Shape::Nil, Shape::Int, Shape::Str, Shape::Symbol, Shape::Pointer];
        let accepted: Vec<Shape> = all.into_iter().filter(|s| s.accepts(v.kind())).collect();
        prop_assert_eq!(accepted, shape_of(&v).into_iter().collect::<Vec<_>>());
    }

    /// Unsupported operations fail the same way for every argument.
    #[test]
    fn prop_unsupported_for_all_arguments(a in any_variant(), b in any_variant(), c in any_variant()) {
        let mut host = ProcessHost::with_directory("/");
        let registry = OperationRegistry::global();
        for (name, args) in [
            ("setresuid", vec![a.clone(), b.clone(), c.clone()]),
            ("setreuid", vec![a.clone(), b.clone()]),
            ("setruid", vec![a.clone()]),
            ("putenv", vec![c.clone()]),
        ] {
            let err = registry.call(&mut host, name, &args).unwrap_err();
            prop_assert!(err.is_unsupported());
        }
    }
}
