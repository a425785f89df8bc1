#![no_main]
use libfuzzer_sys::fuzz_target;
use tagdegree::window_graph::{DegreeTracker, EdgeBackend, Event, RescanGraph, WindowPolicy};

// Each 3-byte chunk is (time delta, tag bitmask, window jitter).
fuzz_target!(|data: &[u8]| {
    let tags = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let mut ordered = DegreeTracker::new(60).unwrap();
    let mut oracle = DegreeTracker::with_backend(WindowPolicy::default(), RescanGraph::new());
    let mut clock: i64 = 0;

    for chunk in data.chunks_exact(3) {
        clock += i64::from(chunk[0] % 8);
        let ts = clock - i64::from(chunk[2] % 90);
        let chosen = tags
            .iter()
            .enumerate()
            .filter(|(i, _)| chunk[1] & (1 << i) != 0)
            .map(|(_, t)| *t);
        let event = Event::new(ts, chosen);

        assert_eq!(ordered.process(&event), oracle.process(&event));
        assert_eq!(ordered.check_invariants(), Ok(()));
        assert_eq!(ordered.backend().edge_count(), oracle.backend().edge_count());
    }
});
