use foundation_alloc::{DEFAULT_ALIGN, Error, MemAllocator, MemoryOptions, globals};

// The globals are process-wide, so the whole lifecycle runs in one test.
#[test]
fn test_globals_lifecycle() -> anyhow::Result<()> {
    assert!(matches!(globals::default_allocator(), Err(Error::NotInitialized)));
    assert!(matches!(globals::shutdown(), Err(Error::NotInitialized)));

    let mut options = MemoryOptions::new();
    options.scratch_buffer_size(256 * 1024);
    globals::init(&options)?;
    assert!(matches!(globals::init(&options), Err(Error::AlreadyInitialized)));

    {
        let a = globals::default_allocator()?;
        let ring_bytes = a.total_allocated();

        let p = a.allocate(100, DEFAULT_ALIGN)?;
        let q = a.allocate(100, DEFAULT_ALIGN)?;
        assert!(a.total_allocated() >= ring_bytes + 200);
        unsafe {
            a.deallocate(p.as_ptr());
            a.deallocate(q.as_ptr());
        }
        assert_eq!(a.total_allocated(), ring_bytes);

        let scratch = globals::default_scratch_allocator()?;
        assert_eq!(scratch.capacity(), 256 * 1024);
        let s = scratch.allocate(10 * 1024, 16)?;
        assert!(scratch.owns(s.as_ptr()));
        unsafe { scratch.deallocate(s.as_ptr()) };
        assert_eq!(scratch.total_allocated(), 0);
    }
    globals::shutdown()?;
    assert!(matches!(globals::default_allocator(), Err(Error::NotInitialized)));

    // A block still held at shutdown is reported as a leak.
    MemoryOptions::new().init()?;
    let a = globals::default_allocator()?;
    let p = a.allocate(64, 8)?;
    let leaked = unsafe { a.allocated_size(p) };
    match globals::shutdown() {
        Err(Error::Leaked { bytes }) => assert_eq!(bytes, leaked),
        other => panic!("expected a leak, got {other:?}"),
    }
    unsafe { a.deallocate(p.as_ptr()) };
    assert_eq!(a.total_allocated(), 0);

    Ok(())
}

#[test]
fn test_scratch_size_validation() {
    let heap = foundation_alloc::HeapAllocator::new();
    assert!(matches!(
        foundation_alloc::ScratchAllocator::new(&heap, 8),
        Err(Error::InvalidLayout { .. })
    ));
}
