use cacheline_bfs::{
    bfs::{do_bfs, do_cacheline_bfs, do_pull_bfs, ProbePolicy},
    experiment::{cacheline_visit, compare_reordered},
    graph::{reorder_by_degree, simplify_graph, squeeze_graph, Builder},
    memory::{Layout, Memory, MemoryConfig},
    types::UNVISITED,
};
use std::io::Write;
use tempfile::NamedTempFile;

const EDGES: &str = "\
# path with a duplicated arc and two stray vertices
0 1
1 2
0 1
2 3
5 5

7 6
";

fn write_graph() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(EDGES.as_bytes()).unwrap();
    file
}

#[test]
fn test_directed_pipeline() {
    let file = write_graph();
    let raw = Builder::new(file.path()).build_csr().unwrap();
    assert_eq!(raw.vertex_number(), 8);
    assert_eq!(raw.edge_number(), 6);
    assert_eq!(do_bfs(&raw, 0), [0, 1, 2, 3, -1, -1, -1, -1]);

    let graph = simplify_graph(raw);
    graph.validate();
    assert_eq!(graph.edge_number(), 5);
    assert_eq!(graph.out_neighbors(0), [1]);

    let (squeezed, vertex_map, vertex_remap) = squeeze_graph(&graph);
    squeezed.validate();
    assert_eq!(vertex_map[4], UNVISITED);
    assert_eq!(vertex_remap, [0, 1, 2, 3, 5, 6, 7]);
    let (reordered, new_ids, _) = reorder_by_degree(&squeezed);
    reordered.validate();

    for &layout in &[Layout::Plain, Layout::SkipIsolated] {
        let config = MemoryConfig {
            layout,
            ..MemoryConfig::default()
        };
        let mut memory = Memory::with_config(&reordered, config);
        memory.check(&reordered);
        let root = new_ids[vertex_map[0] as usize];
        let result = do_cacheline_bfs(&reordered, root, &mut memory, ProbePolicy::default());
        for old in 0..4 {
            let new = new_ids[vertex_map[old] as usize] as usize;
            assert_eq!(result.depth[new], old as i32);
        }
        assert_eq!(result.depth, do_pull_bfs(&reordered, root, true).0);
    }
}

#[test]
fn test_symmetric_pipeline() {
    let file = write_graph();
    let graph = simplify_graph(Builder::new(file.path()).symmetric(true).build_csr().unwrap());
    graph.validate();
    assert!(!graph.is_directed());
    assert_eq!(do_bfs(&graph, 3), [3, 2, 1, 0, -1, -1, -1, -1]);
    assert_eq!(do_bfs(&graph, 6), [-1, -1, -1, -1, -1, -1, 0, 1]);

    let sources = [0, 3, 6];
    let report = compare_reordered(
        &graph,
        &sources,
        MemoryConfig::default(),
        ProbePolicy::EarlyBreak,
    );
    assert_eq!(report.vertex_number, 8);
    assert_eq!(report.non_isolated, 7);
    assert_eq!(
        report.original,
        cacheline_visit(&graph, &sources, MemoryConfig::default(), ProbePolicy::EarlyBreak)
    );
}
