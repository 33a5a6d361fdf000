// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end behavior of the bus network model.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use busnet_network::{
    BusNetwork, ChangeEvent, ChangeKind, ChangeSet, HaltKey, HaltKind, InvalidityReason, ItineraryKey,
    PrimitiveKey, SegmentInsertion,
};
use busnet_road::{Point, RoadNetwork, RoadPath, SegmentRef};

struct City {
    net: BusNetwork,
    roads: RoadNetwork,
    itinerary: ItineraryKey,
}

fn city() -> City {
    let mut net = BusNetwork::new("city");
    let roads = RoadNetwork::new();
    let line = net.add_line("L1").commit(&mut net);
    let itinerary = net.add_itinerary(line, "outbound").commit(&mut net).unwrap();
    City { net, roads, itinerary }
}

fn straight(roads: &mut RoadNetwork, x0: f64, y0: f64, x1: f64, y1: f64) -> SegmentRef {
    roads.add_straight(Point::new(x0, y0), Point::new(x1, y1)).unwrap()
}

fn halt_at(net: &mut BusNetwork, itinerary: ItineraryKey, name: &str, x: f64, y: f64) -> HaltKey {
    let stop = net.add_stop(name, Some(Point::new(x, y))).commit(net);
    net.add_halt(itinerary, name, Some(stop), HaltKind::Systematic)
        .commit(net)
        .unwrap()
}

/// Every container bucket agrees with the validity of its members.
fn assert_partitions(net: &BusNetwork) {
    for &stop in net.valid_stops() {
        assert!(net.is_valid(stop));
    }
    for &stop in net.invalid_stops() {
        assert!(!net.is_valid(stop));
    }
    for &hub in net.valid_hubs() {
        assert!(net.is_valid(hub));
    }
    for &hub in net.invalid_hubs() {
        assert!(!net.is_valid(hub));
    }
    for &line in net.lines() {
        for &itinerary in net.itineraries(line) {
            for &halt in net.valid_halts(itinerary) {
                assert!(net.is_valid(halt), "{halt:?} should be valid");
            }
            for &halt in net.invalid_halts(itinerary) {
                assert!(!net.is_valid(halt), "{halt:?} should be invalid");
            }
            let bindings: Vec<(usize, f64)> = net
                .valid_halts(itinerary)
                .iter()
                .filter_map(|&h| net.halt_binding(h))
                .collect();
            for pair in bindings.windows(2) {
                let ordered = pair[0].0 < pair[1].0 || (pair[0].0 == pair[1].0 && pair[0].1 <= pair[1].1);
                assert!(ordered, "valid halts out of order: {bindings:?}");
            }
        }
    }
}

#[test]
fn scenario_single_segment_route() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(itinerary, s0).commit(&mut net);

    let h1 = halt_at(&mut net, itinerary, "H1", 5.0, 1.0);
    let h2 = halt_at(&mut net, itinerary, "H2", 15.0, 1.0);

    assert!(net.is_valid(h1));
    assert!(net.is_valid(h2));
    assert!(net.is_valid(itinerary), "{:?}", net.invalidity(itinerary));
    assert_relative_eq!(net.itinerary_length(itinerary), 10.0, epsilon = 1e-9);
    assert_eq!(net.valid_halts(itinerary), &[h1, h2]);
    assert!(net.is_starting_halt(h1));
    assert!(net.is_ending_halt(h2));
    assert_eq!(net.section_count(itinerary), 1);
    assert_relative_eq!(net.section_length(itinerary, 0).unwrap(), 10.0, epsilon = 1e-9);
    assert_partitions(&net);
}

#[test]
fn scenario_removing_the_only_segment() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    let id = s0.id();
    net.add_road_segment(itinerary, s0).commit(&mut net);
    let h1 = halt_at(&mut net, itinerary, "H1", 5.0, 1.0);
    let h2 = halt_at(&mut net, itinerary, "H2", 15.0, 1.0);
    assert_eq!(net.valid_halts(itinerary).len(), 2);

    assert!(net.remove_road_segment(itinerary, id, true).commit(&mut net));

    for halt in [h1, h2] {
        assert_eq!(net.invalidity(halt).map(|i| i.reason), Some(InvalidityReason::HaltNotOnRoadSegment));
    }
    assert!(net.valid_halts(itinerary).is_empty());
    assert_eq!(
        net.invalidity(itinerary).map(|i| i.reason),
        Some(InvalidityReason::NoRoadSegmentInItinerary)
    );
    assert_partitions(&net);
}

#[test]
fn scenario_hub_gets_its_first_stop() {
    let mut net = BusNetwork::new("city");
    let hub = net.add_hub("station").commit(&mut net);
    assert_eq!(net.invalidity(hub).map(|i| i.reason), Some(InvalidityReason::NoStopInHub));

    let stop = net.add_stop("platform", Some(Point::new(1.0, 2.0))).commit(&mut net);
    assert!(net.add_stop_to_hub(hub, stop).commit(&mut net));
    assert!(net.is_valid(hub));
    assert_eq!(net.valid_hubs(), &[hub]);
    assert_partitions(&net);
}

#[test]
fn scenario_shared_stop_cascades() {
    let mut net = BusNetwork::new("city");
    let mut roads = RoadNetwork::new();
    let line = net.add_line("L1").commit(&mut net);
    let outbound = net.add_itinerary(line, "outbound").commit(&mut net).unwrap();
    let inbound = net.add_itinerary(line, "inbound").commit(&mut net).unwrap();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(outbound, s0.clone()).commit(&mut net);
    net.add_road_segment(inbound, s0).commit(&mut net);

    let shared = net.add_stop("shared", Some(Point::new(5.0, 1.0))).commit(&mut net);
    let a = net.add_halt(outbound, "a", Some(shared), HaltKind::OnDemand).commit(&mut net).unwrap();
    let b = net.add_halt(inbound, "b", Some(shared), HaltKind::OnDemand).commit(&mut net).unwrap();
    assert!(net.is_valid(a));
    assert!(net.is_valid(b));

    net.set_stop_position(shared, None).commit(&mut net);

    for (itinerary, halt) in [(outbound, a), (inbound, b)] {
        assert_eq!(net.invalidity(halt).map(|i| i.reason), Some(InvalidityReason::InvalidLinkedStop));
        assert_eq!(net.cached_validity(halt).and_then(|v| v.reason()), Some(InvalidityReason::InvalidLinkedStop));
        assert_eq!(net.invalid_halts(itinerary), &[halt]);
    }
    assert_partitions(&net);
}

#[test]
fn scenario_auto_binding_picks_the_closest_segment() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 10.0, 0.0);
    let s1 = straight(&mut roads, 10.0, 0.0, 10.0, 10.0);
    net.add_road_segment_list(itinerary, &[s0, s1]).unwrap().commit(&mut net);

    // 3.0 from the first segment, 1.2 from the second
    let halt = halt_at(&mut net, itinerary, "corner", 8.8, 3.0);
    let (index, offset) = net.halt_binding(halt).unwrap();
    assert_eq!(index, 1);
    assert_relative_eq!(offset, 3.0, epsilon = 1e-9);
}

#[test]
fn unbound_halts_are_bound_when_segments_arrive() {
    let City { mut net, mut roads, itinerary } = city();
    let h1 = halt_at(&mut net, itinerary, "H1", 2.0, 1.0);
    let h2 = halt_at(&mut net, itinerary, "H2", 18.0, 1.0);
    assert_eq!(net.invalidity(h1).map(|i| i.reason), Some(InvalidityReason::HaltNotOnRoadSegment));

    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(itinerary, s0).commit(&mut net);
    assert!(net.is_valid(h1));
    assert!(net.is_valid(h2));
    assert!(net.is_valid(itinerary));
    assert_relative_eq!(net.itinerary_length(itinerary), 16.0, epsilon = 1e-9);
}

#[test]
fn revalidate_is_idempotent() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(itinerary, s0).commit(&mut net);
    halt_at(&mut net, itinerary, "H1", 5.0, 1.0);
    halt_at(&mut net, itinerary, "H2", 15.0, 1.0);
    let orphan = net.add_stop("orphan", None).commit(&mut net);

    net.revalidate(PrimitiveKey::Network, false);
    let valid_before = net.valid_halts(itinerary).to_vec();
    let stops_before = (net.valid_stops().to_vec(), net.invalid_stops().to_vec());

    let events = net.revalidate(PrimitiveKey::Network, false);
    assert!(events.iter().all(|e| e.kind != ChangeKind::Validity));
    assert_eq!(net.valid_halts(itinerary), valid_before.as_slice());
    assert_eq!((net.valid_stops().to_vec(), net.invalid_stops().to_vec()), stops_before);
    assert_eq!(net.invalid_stops(), &[orphan]);
    assert_partitions(&net);
}

#[test]
fn halts_declared_against_the_road_stay_valid() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(itinerary, s0).commit(&mut net);
    let late = halt_at(&mut net, itinerary, "late", 15.0, 1.0);
    let early = halt_at(&mut net, itinerary, "early", 5.0, 1.0);

    // Valid halts follow the road; the declared order only keeps invalid ones
    assert_eq!(net.valid_halts(itinerary), &[early, late]);
    assert_eq!(net.halts(itinerary), vec![late, early]);
    assert!(net.is_valid(itinerary), "{:?}", net.invalidity(itinerary));
    assert_relative_eq!(net.itinerary_length(itinerary), 10.0, epsilon = 1e-9);
    assert_partitions(&net);
}

#[test]
fn unused_segment_beyond_terminus() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 10.0, 0.0);
    let s1 = straight(&mut roads, 10.0, 0.0, 20.0, 0.0);
    net.add_road_segment_list(itinerary, &[s0, s1]).unwrap().commit(&mut net);
    halt_at(&mut net, itinerary, "H1", 2.0, 1.0);
    halt_at(&mut net, itinerary, "H2", 8.0, 1.0);
    assert_eq!(
        net.invalidity(itinerary).map(|i| i.reason),
        Some(InvalidityReason::UnusedRoadSegmentBeyondTerminus)
    );
}

#[test]
fn invert_twice_restores_the_route() {
    let City { mut net, mut roads, itinerary } = city();
    let path = [
        straight(&mut roads, 0.0, 0.0, 10.0, 0.0),
        straight(&mut roads, 10.0, 0.0, 20.0, 0.0),
        straight(&mut roads, 20.0, 0.0, 30.0, 0.0),
    ];
    let ids: Vec<_> = path.iter().map(|s| s.id()).collect();
    net.add_road_segment_list(itinerary, &path).unwrap().commit(&mut net);
    let halts = [
        halt_at(&mut net, itinerary, "a", 2.0, 1.0),
        halt_at(&mut net, itinerary, "b", 15.0, 1.0),
        halt_at(&mut net, itinerary, "c", 28.0, 1.0),
    ];
    assert!(net.is_valid(itinerary));
    let length = net.itinerary_length(itinerary);
    let bindings: Vec<_> = halts.iter().map(|&h| net.halt_binding(h).unwrap()).collect();

    let m = net.invert(itinerary);
    assert!(m.changes.events().iter().any(|e| e.kind == ChangeKind::ItineraryInverted));
    m.commit(&mut net);

    for (&halt, &(index, offset)) in halts.iter().zip(&bindings) {
        let (inverted, same_offset) = net.halt_binding(halt).unwrap();
        assert_eq!(inverted, 3 - index - 1);
        assert_relative_eq!(same_offset, offset);
    }
    assert_eq!(net.valid_halts(itinerary), &[halts[2], halts[1], halts[0]]);
    assert!(net.is_valid(itinerary), "{:?}", net.invalidity(itinerary));
    assert_relative_eq!(net.itinerary_length(itinerary), length, epsilon = 1e-9);

    net.invert(itinerary).commit(&mut net);
    let restored: Vec<_> = (0..3).filter_map(|i| net.road_segment_at(itinerary, i)).map(|s| s.id()).collect();
    assert_eq!(restored, ids);
    for (&halt, &binding) in halts.iter().zip(&bindings) {
        assert_eq!(net.halt_binding(halt).unwrap(), binding);
    }
    assert_eq!(net.valid_halts(itinerary), &halts);
    assert_partitions(&net);
}

#[test]
fn invert_keeps_halts_on_one_segment_ordered() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(itinerary, s0).commit(&mut net);
    let h1 = halt_at(&mut net, itinerary, "H1", 5.0, 1.0);
    let h2 = halt_at(&mut net, itinerary, "H2", 15.0, 1.0);

    net.invert(itinerary).commit(&mut net);
    assert_eq!(net.halt_binding(h1), Some((0, 5.0)));
    assert_eq!(net.halt_binding(h2), Some((0, 15.0)));
    assert_eq!(net.valid_halts(itinerary), &[h1, h2]);
    assert!(net.is_valid(itinerary), "{:?}", net.invalidity(itinerary));
    assert_relative_eq!(net.itinerary_length(itinerary), 10.0, epsilon = 1e-9);
    assert_relative_eq!(net.section_length(itinerary, 0).unwrap(), 10.0, epsilon = 1e-9);
    assert_partitions(&net);
}

#[test]
fn disjoint_path_does_not_move_other_halts() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 10.0, 0.0);
    let s1 = straight(&mut roads, 10.0, 0.0, 20.0, 0.0);
    net.add_road_segment_list(itinerary, &[s0, s1]).unwrap().commit(&mut net);
    let a = halt_at(&mut net, itinerary, "a", 2.0, 1.0);
    let b = halt_at(&mut net, itinerary, "b", 18.0, 1.0);
    let before = (net.halt_binding(a), net.halt_binding(b));

    let far = straight(&mut roads, 100.0, 100.0, 110.0, 100.0);
    let far_id = far.id();
    net.add_road_segment(itinerary, far.clone()).commit(&mut net);
    assert_eq!(net.road_path(itinerary).unwrap().cluster_count(), 2);
    assert_eq!((net.halt_binding(a), net.halt_binding(b)), before);

    net.remove_road_segment(itinerary, far_id, true).commit(&mut net);
    assert_eq!((net.halt_binding(a), net.halt_binding(b)), before);
    assert!(net.is_valid(itinerary));

    net.add_road_segment(itinerary, far).commit(&mut net);
    assert_eq!((net.halt_binding(a), net.halt_binding(b)), before);
    assert_partitions(&net);
}

#[test]
fn removal_in_the_middle_splits_the_route() {
    let City { mut net, mut roads, itinerary } = city();
    let path = [
        straight(&mut roads, 0.0, 0.0, 10.0, 0.0),
        straight(&mut roads, 10.0, 0.0, 20.0, 0.0),
        straight(&mut roads, 20.0, 0.0, 30.0, 0.0),
    ];
    let middle = path[1].id();
    net.add_road_segment_list(itinerary, &path).unwrap().commit(&mut net);
    let a = halt_at(&mut net, itinerary, "a", 2.0, 1.0);
    let c = halt_at(&mut net, itinerary, "c", 28.0, 1.0);

    net.remove_road_segment(itinerary, middle, true).commit(&mut net);
    assert_eq!(net.road_path(itinerary).unwrap().cluster_count(), 2);
    assert_eq!(net.halt_binding(c).map(|(i, _)| i), Some(1));
    assert_eq!(net.halt_binding(a).map(|(i, _)| i), Some(0));
    assert_eq!(
        net.invalidity(itinerary).map(|i| i.reason),
        Some(InvalidityReason::DiscontinuousPathInItinerary)
    );

    // Putting the segment back reconnects both pieces
    net.add_road_segment(itinerary, path[1].clone()).commit(&mut net);
    assert_eq!(net.road_path(itinerary).unwrap().cluster_count(), 1);
    assert_eq!(net.halt_binding(c).map(|(i, _)| i), Some(2));
    assert!(net.is_valid(itinerary));
}

#[test]
fn listeners_and_silent_application() {
    let City { mut net, mut roads, itinerary } = city();
    let seen: Rc<RefCell<Vec<ChangeKind>>> = Rc::default();
    let sink = seen.clone();
    net.add_listener(move |event: &ChangeEvent| sink.borrow_mut().push(event.kind));

    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    let (_, changes) = net.add_road_segment(itinerary, s0).into_parts();
    let applied = net.apply(changes, false);
    assert!(applied.iter().any(|e| e.kind == ChangeKind::SegmentAdded));
    assert!(seen.borrow().is_empty());

    halt_at(&mut net, itinerary, "H1", 5.0, 1.0);
    let kinds = seen.borrow();
    assert!(kinds.contains(&ChangeKind::StopAdded));
    assert!(kinds.contains(&ChangeKind::ItineraryHaltAdded));
    assert!(kinds.contains(&ChangeKind::Validity));
}

#[test]
fn bulk_load_then_rebuild() {
    let mut net = BusNetwork::new("city");
    let mut roads = RoadNetwork::new();
    let validity_events = Rc::new(RefCell::new(0usize));
    let sink = validity_events.clone();
    net.add_listener(move |event: &ChangeEvent| {
        if event.kind == ChangeKind::Validity {
            *sink.borrow_mut() += 1;
        }
    });

    // Build everything without settling anything
    let mut batch = ChangeSet::new();
    let line = net.add_line("L1").defer(&mut batch);
    let itinerary = net.add_itinerary(line, "outbound").defer(&mut batch).unwrap();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(itinerary, s0).defer(&mut batch);
    let a = net.add_stop("a", Some(Point::new(5.0, 1.0))).defer(&mut batch);
    let b = net.add_stop("b", Some(Point::new(15.0, 1.0))).defer(&mut batch);
    net.add_halt(itinerary, "H1", Some(a), HaltKind::Systematic).defer(&mut batch);
    net.add_halt(itinerary, "H2", Some(b), HaltKind::Systematic).defer(&mut batch);
    assert!(!batch.is_empty());
    assert_eq!(*validity_events.borrow(), 0);

    let events = net.rebuild(true);
    assert_eq!(*validity_events.borrow(), events.len());
    assert!(events.iter().any(|e| e.source == PrimitiveKey::Network));
    assert!(net.is_valid(PrimitiveKey::Network), "{:?}", net.invalidity(PrimitiveKey::Network));
    assert_eq!(net.valid_halts(itinerary).len(), 2);
    assert_partitions(&net);

    // Nothing left to announce
    assert!(net.rebuild(true).is_empty());
}

#[test]
fn removing_a_line_invalidates_its_halts() {
    let City { mut net, mut roads, itinerary } = city();
    let s0 = straight(&mut roads, 0.0, 0.0, 20.0, 0.0);
    net.add_road_segment(itinerary, s0).commit(&mut net);
    let h1 = halt_at(&mut net, itinerary, "H1", 5.0, 1.0);
    halt_at(&mut net, itinerary, "H2", 15.0, 1.0);
    assert!(net.is_valid(itinerary));

    let line = net.line_at(0).unwrap();
    net.remove_line(line).commit(&mut net);
    assert_eq!(net.invalidity(h1).map(|i| i.reason), Some(InvalidityReason::NotInSameNetwork));
    assert_eq!(
        net.invalidity(itinerary).map(|i| i.reason),
        Some(InvalidityReason::NotEnoughValidBusHalts)
    );

    net.attach_line(line).commit(&mut net);
    assert!(net.is_valid(h1));
    assert!(net.is_valid(itinerary));
    assert_partitions(&net);
}

#[test]
fn auto_loop_joins_a_branch_and_rebinds_halts() {
    let City { mut net, mut roads, itinerary } = city();
    let a = straight(&mut roads, 0.0, 0.0, 10.0, 0.0);
    let b = straight(&mut roads, 10.0, 0.0, 30.0, 0.0);
    let a_id = a.id();
    net.add_road_segment_list(itinerary, &[a, b]).unwrap().commit(&mut net);
    let h1 = halt_at(&mut net, itinerary, "H1", 5.0, 1.0);
    assert_eq!(net.halt_binding(h1), Some((0, 5.0)));
    assert_eq!(
        net.invalidity(itinerary).map(|i| i.reason),
        Some(InvalidityReason::NotEnoughValidBusHalts)
    );

    // The branch starts in the middle of the route
    let branch = straight(&mut roads, 10.0, 0.0, 10.0, 10.0);
    let branch_id = branch.id();
    let insertion = SegmentInsertion {
        auto_connect_halts: true,
        auto_loop: true,
    };
    assert!(net
        .add_road_segments(itinerary, RoadPath::single(branch), insertion)
        .commit(&mut net));

    let road = net.road_path(itinerary).unwrap();
    assert_eq!(road.cluster_count(), 1);
    assert_eq!(road.segment_count(), 4);
    assert_eq!(net.index_of_road_segment(itinerary, branch_id), Some(0));
    assert_eq!(net.last_index_of_road_segment(itinerary, a_id), Some(2));
    // H1 follows its original occurrence of `a`
    assert_eq!(net.halt_binding(h1), Some((2, 5.0)));

    let h0 = halt_at(&mut net, itinerary, "H0", 10.0, 9.0);
    let h2 = halt_at(&mut net, itinerary, "H2", 28.0, 1.0);
    assert_eq!(net.halt_binding(h0).map(|(i, _)| i), Some(0));
    assert_eq!(net.halt_binding(h2).map(|(i, _)| i), Some(3));
    assert_eq!(net.valid_halts(itinerary), &[h0, h1, h2]);
    assert!(net.is_valid(itinerary), "{:?}", net.invalidity(itinerary));
    // 1 down the branch, 10 back along `a`, 5 on `a`, then 10 + 18 to H2
    assert_relative_eq!(net.itinerary_length(itinerary), 47.0, epsilon = 1e-9);
    assert_partitions(&net);
}

#[test]
fn auto_loop_adds_a_detour_to_a_valid_route() {
    let City { mut net, mut roads, itinerary } = city();
    let path = [
        straight(&mut roads, 0.0, 0.0, 10.0, 0.0),
        straight(&mut roads, 10.0, 0.0, 20.0, 0.0),
        straight(&mut roads, 20.0, 0.0, 30.0, 0.0),
    ];
    net.add_road_segment_list(itinerary, &path).unwrap().commit(&mut net);
    let first = halt_at(&mut net, itinerary, "first", 2.0, 1.0);
    let middle = halt_at(&mut net, itinerary, "middle", 15.0, 1.0);
    let last = halt_at(&mut net, itinerary, "last", 28.0, 1.0);
    assert!(net.is_valid(itinerary));

    let detour = roads
        .add_segment(vec![Point::new(10.0, 0.0), Point::new(15.0, 5.0), Point::new(20.0, 0.0)])
        .unwrap();
    let detour_id = detour.id();
    let insertion = SegmentInsertion {
        auto_connect_halts: true,
        auto_loop: true,
    };
    let m = net.add_road_segments(itinerary, RoadPath::single(detour), insertion);
    let added = m.changes.events().iter().find(|e| e.kind == ChangeKind::SegmentAdded).map(|e| e.index);
    assert_eq!(added, Some(Some(2)));
    m.commit(&mut net);

    assert_eq!(net.road_path(itinerary).unwrap().cluster_count(), 1);
    assert_eq!(net.index_of_road_segment(itinerary, detour_id), Some(2));
    assert_eq!(net.halt_binding(first).map(|(i, _)| i), Some(0));
    assert_eq!(net.halt_binding(middle).map(|(i, _)| i), Some(1));
    assert_eq!(net.halt_binding(last).map(|(i, _)| i), Some(4));
    assert!(net.is_valid(itinerary), "{:?}", net.invalidity(itinerary));
    assert_relative_eq!(net.itinerary_length(itinerary), 36.0 + 2.0 * 50f64.sqrt(), epsilon = 1e-9);
    assert_partitions(&net);
}
