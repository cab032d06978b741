use std::sync::Arc;

use num_complex::Complex64;
use tps_algo::test_utils::{add_break, add_points, reference_lattice, segments};
use tps_algo::{CellId, LoadPoint, Router, SegmentIndex};
use tps_core::{CircuitGraph, ConductanceModel, ConstantLattice, Millimeters, NodeIndex};

fn multi_branch_router() -> Router {
    let mut graph = CircuitGraph::new();
    add_points(&mut graph, 0, 1, &[0, 1_200, 4_000]);
    add_points(&mut graph, 0, 2, &[0, 2_500, 4_000]);
    add_points(&mut graph, 0, 3, &[2_000, 4_000]);
    add_points(&mut graph, 1, 1, &[-500, 800]);
    add_points(&mut graph, 1, 2, &[-500, 800]);

    let lattice: Arc<dyn ConductanceModel> = Arc::new(reference_lattice(3));
    let mut router = Router::new(graph)
        .with_network(0, segments(&[(2_000, 2), (4_000, 3)], Arc::clone(&lattice)))
        .with_network(1, segments(&[(800, 2)], lattice));
    router.wire().unwrap();

    let y = Complex64::new(0.05, -0.01);
    router
        .add_loads(
            0,
            vec![
                LoadPoint::new(Millimeters(300), 1, y),
                LoadPoint::new(Millimeters(900), 2, y),
                LoadPoint::new(Millimeters(3_100), 3, y),
            ],
        )
        .unwrap();
    router
        .add_loads(1, vec![LoadPoint::new(Millimeters(0), 2, y)])
        .unwrap();
    router
}

fn conductances(graph: &CircuitGraph, router: &Router, branch: u32, partition: usize) -> Vec<Complex64> {
    router.branch(branch).unwrap().partitions()[partition]
        .cells()
        .flat_map(|cell| cell.mesh_edges().iter())
        .map(|mesh| graph.edge(mesh.edge).unwrap().conductance)
        .collect()
}

#[test]
fn chains_are_contiguous_and_aligned() {
    let router = multi_branch_router();
    for layout in router.branches() {
        for partition in layout.partitions() {
            let cells: Vec<_> = partition.cells().collect();
            assert_eq!(cells.len(), partition.capacity());
            assert_eq!(cells[0].x_left(), partition.x_left());
            assert_eq!(cells[cells.len() - 1].x_right(), partition.x_right());
            for pair in cells.windows(2) {
                assert_eq!(pair[0].x_right(), pair[1].x_left());
                assert_eq!(pair[0].right(), pair[1].left());
            }
        }
    }
    let diag = router.validate();
    assert!(!diag.has_errors(), "{diag}");
}

#[test]
fn sections_match_active_tracks_and_mesh_size() {
    let router = multi_branch_router();
    for layout in router.branches() {
        for partition in layout.partitions() {
            let tracks = partition.active_tracks().len();
            for cell in partition.cells() {
                assert_eq!(cell.left().len(), tracks);
                assert_eq!(cell.right().len(), tracks);
                let m = cell.left().len() + cell.right().len();
                assert_eq!(cell.edge_count(), m * (m + 1) / 2);
            }
        }
    }
}

#[test]
fn consecutive_partitions_share_cross_sections() {
    let router = multi_branch_router();
    let graph = router.graph();
    for layout in router.branches() {
        for pair in layout.partitions().windows(2) {
            assert_eq!(pair[0].x_right(), pair[1].x_left());
            for (track, node) in pair[1].left().entries() {
                if let Some(shared) = pair[0].right().node_on_track(*track) {
                    assert_eq!(shared, *node);
                }
                assert_eq!(graph.node(*node).unwrap().x, pair[1].x_left());
            }
        }
    }
}

#[test]
fn pulls_are_idempotent_and_reversible() {
    let mut graph = CircuitGraph::new();
    add_points(&mut graph, 0, 1, &[0, 1_000]);
    add_points(&mut graph, 0, 2, &[0, 1_000]);
    let router = {
        let mut router = Router::new(graph)
            .with_network(0, segments(&[(1_000, 2)], Arc::new(reference_lattice(2))));
        router.wire().unwrap();
        router
    };
    let mut partition = router.branch(0).unwrap().partitions()[0].clone();
    let mut graph = router.graph().clone();

    partition.ensure_capacity([Millimeters(400)]);
    partition.init_cells(&mut graph);
    let snapshot = |graph: &CircuitGraph, partition: &tps_algo::Partition| {
        let ys: Vec<Complex64> = partition
            .cells()
            .flat_map(|c| c.mesh_edges().iter())
            .map(|m| graph.edge(m.edge).unwrap().conductance)
            .collect();
        let xs: Vec<Millimeters> = graph.nodes().map(|(_, n)| n.x).collect();
        (ys, xs)
    };

    let original = snapshot(&graph, &partition);
    partition
        .pull_right(&mut graph, CellId(0), Millimeters(1_000))
        .unwrap();
    assert_eq!(snapshot(&graph, &partition), original);

    partition
        .pull_right(&mut graph, CellId(0), Millimeters(400))
        .unwrap();
    assert_ne!(snapshot(&graph, &partition), original);
    partition
        .pull_left(&mut graph, CellId(1), Millimeters(1_000))
        .unwrap();
    assert_eq!(snapshot(&graph, &partition), original);
}

#[test]
fn capacity_never_decreases() {
    let router = multi_branch_router();
    let mut partition = router.branch(0).unwrap().partitions()[0].clone();
    let before = partition.capacity();
    partition.ensure_capacity(std::iter::empty());
    assert_eq!(partition.capacity(), before);
    partition.ensure_capacity([Millimeters(100), Millimeters(200), Millimeters(300), Millimeters(400)]);
    let grown = partition.capacity();
    assert!(grown >= before);
    partition.ensure_capacity([Millimeters(100)]);
    assert_eq!(partition.capacity(), grown);
}

#[test]
fn three_track_load_scenario() {
    let mut graph = CircuitGraph::new();
    for track in 1..=3 {
        add_points(&mut graph, 0, track, &[0, 1_000]);
    }
    let mut router = Router::new(graph).with_network(
        0,
        segments(&[(1_000, 3)], Arc::new(ConstantLattice::new(2.0, -1.0))),
    );
    router.build_partitions(0).unwrap();
    router.init_cells(0).unwrap();
    let admittance = Complex64::new(0.04, -0.012);
    router
        .add_loads(0, vec![LoadPoint::new(Millimeters(400), 1, admittance)])
        .unwrap();

    let graph = router.graph();
    let at = |x: i64, track: u32| -> Vec<NodeIndex> {
        graph
            .nodes()
            .filter(|(_, n)| !n.is_ground() && n.x == Millimeters(x) && n.track() == track)
            .map(|(i, _)| i)
            .collect()
    };
    for track in 1..=3 {
        assert_eq!(at(0, track).len(), 1, "track {track} at 0");
        assert_eq!(at(1_000, track).len(), 1, "track {track} at 1000");
    }
    let split = at(400, 1);
    assert_eq!(split.len(), 1);

    let ground = graph.ground();
    let load_edges: Vec<_> = graph
        .edges_of(split[0])
        .filter(|(_, other, edge)| *other == ground && edge.conductance == admittance)
        .collect();
    assert_eq!(load_edges.len(), 1);

    let partition = &router.branch(0).unwrap().partitions()[0];
    let bounds: Vec<_> = partition.cells().map(|c| (c.x_left(), c.x_right())).collect();
    assert_eq!(
        bounds,
        vec![
            (Millimeters(0), Millimeters(400)),
            (Millimeters(400), Millimeters(1_000))
        ]
    );
}

#[test]
fn insulation_break_scenario() {
    let mut graph = CircuitGraph::new();
    add_points(&mut graph, 0, 1, &[0, 1_000]);
    let brk = add_break(&mut graph, 0, 1, 500);
    let mut router = Router::new(graph)
        .with_network(0, segments(&[(1_000, 1)], Arc::new(ConstantLattice::new(1.0, 0.0))));
    router.wire().unwrap();

    let layout = router.branch(0).unwrap();
    assert_eq!(layout.partitions().len(), 2);
    let before = &layout.partitions()[0];
    let after = &layout.partitions()[1];

    let near = before.cells().last().unwrap().right().node_on_track(1).unwrap();
    let far = after.cells().next().unwrap().left().node_on_track(1).unwrap();
    assert_eq!(near, brk);
    assert_ne!(near, far);

    let graph = router.graph();
    assert!(graph.node(far).unwrap().is_break_copy);
    assert_eq!(graph.node(far).unwrap().x, Millimeters(500));
    assert!(!graph.are_adjacent(near, far));

    let at_break = graph
        .nodes()
        .filter(|(_, n)| !n.is_ground() && n.x == Millimeters(500))
        .count();
    assert_eq!(at_break, 2);
}

#[test]
fn segment_cursor_never_rescans() {
    let lattice: Arc<dyn ConductanceModel> = Arc::new(ConstantLattice::new(1.0, 0.0));
    let mut index =
        SegmentIndex::from_specs(segments(&[(100, 1), (200, 2), (300, 3), (400, 1)], lattice))
            .unwrap();
    for x in 0..=400 {
        index.find_segment(Millimeters(x)).unwrap();
    }
    assert_eq!(index.cursor_moves(), 3);
}

#[test]
fn rearranging_after_new_loads_keeps_graph_consistent() {
    let mut router = multi_branch_router();
    let before = conductances(router.graph(), &router, 1, 0);
    router
        .add_loads(
            0,
            vec![LoadPoint::new(Millimeters(250), 1, Complex64::new(0.01, 0.0))],
        )
        .unwrap();
    // branch 1 is untouched by loads on branch 0
    assert_eq!(conductances(router.graph(), &router, 1, 0), before);
    let diag = router.validate();
    assert!(!diag.has_errors(), "{diag}");
}
