#![allow(missing_docs)]
//! Benchmarks for incremental light propagation.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use kiln_core::chunk::LightChannel;
use kiln_core::chunk::light_engine::{LightAccess, LightEngine};
use kiln_utils::BlockPos;

const SIZE: i32 = 48;
const CENTER: i32 = SIZE / 2;

/// A closed cube of air cells, dark and without sky access.
struct Cavity {
    light: Vec<u8>,
    opacity: Vec<u8>,
    emitter: Option<(BlockPos, u8)>,
}

impl Cavity {
    fn new(pillars: bool) -> Self {
        let cells = (SIZE * SIZE * SIZE) as usize;
        let mut opacity = vec![0; cells];
        if pillars {
            // Opaque columns on a 3 block grid force the flood around corners.
            for x in (0..SIZE).step_by(3) {
                for z in (1..SIZE).step_by(3) {
                    for y in 0..SIZE {
                        opacity[Self::index(BlockPos::new(x, y, z))] = 15;
                    }
                }
            }
        }
        Self {
            light: vec![0; cells],
            opacity,
            emitter: None,
        }
    }

    fn index(pos: BlockPos) -> usize {
        ((pos.y() * SIZE + pos.z()) * SIZE + pos.x()) as usize
    }

    fn contains(pos: BlockPos) -> bool {
        (0..SIZE).contains(&pos.x()) && (0..SIZE).contains(&pos.y()) && (0..SIZE).contains(&pos.z())
    }
}

impl LightAccess for Cavity {
    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool {
        Self::contains(center.offset(-radius, -radius, -radius))
            && Self::contains(center.offset(radius, radius, radius))
    }

    fn light(&self, channel: LightChannel, pos: BlockPos) -> u8 {
        if Self::contains(pos) && channel == LightChannel::Block {
            self.light[Self::index(pos)]
        } else {
            channel.default_level()
        }
    }

    fn set_light(&mut self, channel: LightChannel, pos: BlockPos, level: u8) {
        if Self::contains(pos) && channel == LightChannel::Block {
            self.light[Self::index(pos)] = level;
        }
    }

    fn opacity(&self, pos: BlockPos) -> u8 {
        if Self::contains(pos) {
            self.opacity[Self::index(pos)]
        } else {
            15
        }
    }

    fn emission(&self, pos: BlockPos) -> u8 {
        match self.emitter {
            Some((emitter, level)) if emitter == pos => level,
            _ => 0,
        }
    }

    fn can_see_sky(&self, _pos: BlockPos) -> bool {
        false
    }
}

fn bench_torch_cycle(c: &mut Criterion) {
    let origin = BlockPos::new(CENTER, CENTER, CENTER - 1);
    let mut group = c.benchmark_group("torch_place_and_remove");

    for pillars in [false, true] {
        let mut cavity = Cavity::new(pillars);
        let mut engine = LightEngine::new();
        let name = if pillars { "pillars" } else { "open" };

        group.bench_with_input(BenchmarkId::new("cavity", name), &pillars, |b, _| {
            b.iter(|| {
                cavity.emitter = Some((origin, 14));
                black_box(engine.recompute_light(&mut cavity, LightChannel::Block, black_box(origin)));
                cavity.emitter = None;
                black_box(engine.recompute_light(&mut cavity, LightChannel::Block, black_box(origin)));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_torch_cycle);
criterion_main!(benches);
