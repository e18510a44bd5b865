//! Chunk codec throughput.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use homestead_common::{ChunkCoord, CropTypeId, SectionId, TileCoord};
use homestead_world::{Chunk, ChunkFormat};

fn planted_chunk() -> Chunk {
    let mut chunk = Chunk::new(ChunkCoord::new(2, -1), SectionId::new(1), 32);
    let origin = ChunkCoord::new(2, -1).origin_tile(32);
    for y in 0..32 {
        for x in 0..32 {
            let tile = TileCoord::new(origin.x + x, origin.y + y);
            let _ = chunk.till(tile);
            if (x + y) % 2 == 0 {
                let _ = chunk.plant_crop(CropTypeId::new(3), tile);
            }
        }
    }
    chunk
}

fn bench_codec(c: &mut Criterion) {
    let chunk = planted_chunk();
    for format in [ChunkFormat::Legacy, ChunkFormat::Extended] {
        let bytes = chunk.encode(format).expect("encode");
        c.bench_function(&format!("encode_{format:?}"), |b| {
            b.iter(|| black_box(&chunk).encode(format));
        });
        c.bench_function(&format!("decode_{format:?}"), |b| {
            b.iter(|| Chunk::from_bytes(black_box(&bytes), 32));
        });
    }
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
