//! Benchmarks for lifecycle manager passes.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tether::{Directive, LifecycleManager};
use tether_dom::{Document, Node};

struct Noop;

impl Directive<Node> for Noop {}

/// Build a tree of `<div>` elements with the given depth and breadth.
///
/// Every other element carries `copy-text`, so roughly half the nodes match
/// `[copy-text]`.
fn create_tree(doc: &Document, depth: usize, breadth: usize) -> Node {
    fn create_level(
        doc: &Document,
        parent: &Node,
        depth: usize,
        breadth: usize,
        index: &mut usize,
    ) {
        if depth == 0 {
            return;
        }
        for _ in 0..breadth {
            let node = doc.create_element("div");
            if *index % 2 == 0 {
                node.set_attribute("copy-text", "x").unwrap();
            }
            *index += 1;
            parent.append_child(&node).unwrap();
            create_level(doc, &node, depth - 1, breadth, index);
        }
    }

    let root = doc.create_element("main");
    create_level(doc, &root, depth, breadth, &mut 0);
    doc.root().append_child(&root).unwrap();
    root
}

fn bench_initial_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_pass");

    // Small: ~40 nodes, Medium: ~340 nodes, Large: ~1365 nodes
    for (depth, breadth, label) in [(3, 3, "small"), (4, 4, "medium"), (5, 4, "large")] {
        let doc = Document::new();
        let root = create_tree(&doc, depth, breadth);

        group.bench_with_input(BenchmarkId::new("attach_to", label), &root, |b, root| {
            b.iter_with_setup(
                || LifecycleManager::new(doc.clone(), "[copy-text]", |_: &Node| Noop),
                |manager| manager.attach_to(root),
            );
        });
    }

    group.finish();
}

fn bench_mutation_batches(c: &mut Criterion) {
    let doc = Document::new();
    let root = create_tree(&doc, 4, 4);
    let _manager = tether::register(doc.clone(), &root, "[copy-text]", |_: &Node| Noop);

    let mut group = c.benchmark_group("mutation_batch");

    group.bench_function("attribute_change", |b| {
        let target = root.children()[0].clone();
        b.iter(|| {
            target.set_attribute("copy-text", "y").unwrap();
            doc.flush_mutations()
        });
    });

    group.bench_function("filtered_attribute_change", |b| {
        let target = root.children()[0].clone();
        b.iter(|| {
            target.set_attribute("title", "ignored").unwrap();
            doc.flush_mutations()
        });
    });

    group.bench_function("subtree_move", |b| {
        let subtree = root.children()[1].clone();
        b.iter(|| {
            subtree.remove();
            root.append_child(&subtree).unwrap();
            doc.flush_mutations()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_initial_pass, bench_mutation_batches);
criterion_main!(benches);
