// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use understory_reconcile::{
    Backend, Callback, HostTree, LocalBoxFuture, MemoryHost, Part, RequestCallbackOptions,
    Root, Runtime, RuntimeOptions, Template, TemplateMode, TemplateNode,
    TemplateResult, UpdateOptions, Value,
};

/// Runs everything inline; benches only use synchronous flushes.
struct Headless {
    host: MemoryHost,
}

impl Backend for Headless {
    fn host(&self) -> &dyn HostTree {
        &self.host
    }

    fn request_callback(
        &self,
        callback: Callback,
        _: RequestCallbackOptions,
    ) -> LocalBoxFuture<'static, ()> {
        callback()
    }

    fn start_view_transition(&self, callback: Box<dyn FnOnce()>) -> LocalBoxFuture<'static, ()> {
        callback();
        Box::pin(async {})
    }

    fn yield_to_main(&self) -> LocalBoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

fn setup(value: Value) -> (Rc<Headless>, Root) {
    let backend = Rc::new(Headless {
        host: MemoryHost::new(),
    });
    let container = backend.host.create_element("div", TemplateMode::Html);
    let anchor = backend.host.create_comment("");
    backend.host.append_child(container, anchor);
    let runtime = Runtime::from_rc(backend.clone(), RuntimeOptions::default());
    let root = runtime
        .create_root(value, Part::ChildNode { anchor })
        .with_options(UpdateOptions::default().with_flush_sync(true));
    root.mount();
    (backend, root)
}

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_u32() as usize) % (i + 1);
            items.swap(i, j);
        }
    }
}

fn list(keys: &[u32]) -> Value {
    Value::repeat(keys.iter().map(|k| (*k, Value::from(*k))))
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_reconcile");
    group.sample_size(50);

    let row = Rc::new(Template::new(
        vec![
            TemplateNode::element("li")
                .attribute_hole("class")
                .child(TemplateNode::ChildHole),
        ],
        TemplateMode::Html,
    ));
    let mut tick = 0_u32;
    let (backend, root) = setup(Value::from(TemplateResult::new(
        row.clone(),
        [Value::from("even"), Value::from(0)],
    )));
    group.bench_function("template_hole_update", |b| {
        b.iter(|| {
            tick = tick.wrapping_add(1);
            let class = if tick % 2 == 0 { "even" } else { "odd" };
            root.update(TemplateResult::new(
                row.clone(),
                [Value::from(class), Value::from(tick)],
            ));
            black_box(backend.host.take_ops());
        });
    });

    let (backend, root) = setup(Value::from("same"));
    group.bench_function("unchanged_text", |b| {
        b.iter(|| {
            root.update("same");
            black_box(backend.host.take_ops());
        });
    });

    for &n in &[64_u32, 1_024_u32] {
        let mut keys: Vec<u32> = (0..n).collect();
        let mut rng = Lcg(0x5EED_0000_0000_0001);
        let (backend, root) = setup(list(&keys));
        group.bench_function(format!("repeat_shuffle(n={n})"), |b| {
            b.iter(|| {
                rng.shuffle(&mut keys);
                root.update(list(&keys));
                black_box(backend.host.take_ops());
            });
        });

        let full: Vec<u32> = (0..n).collect();
        let half: Vec<u32> = (0..n).step_by(2).collect();
        let (backend, root) = setup(list(&full));
        let mut shrink = true;
        group.bench_function(format!("repeat_insert_remove(n={n})"), |b| {
            b.iter(|| {
                root.update(list(if shrink { &half } else { &full }));
                shrink = !shrink;
                black_box(backend.host.take_ops());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
