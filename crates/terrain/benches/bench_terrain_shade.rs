use std::hint::black_box;
use std::time::Instant;

use glam::Vec2;
use terrascape_noise::NoiseParameters;
use terrascape_terrain::TerrainMesh;

fn bench_shade(subdivisions: u32, iterations: usize) {
    let mesh = TerrainMesh::new(15.0, 15.0, subdivisions).expect("valid grid");
    let params = NoiseParameters::default();
    let mut out = Vec::new();

    let start = Instant::now();
    for i in 0..iterations {
        let origin = Vec2::new(i as f32 * 0.05, 0.0);
        mesh.shade_into(black_box(&params), origin, &mut out);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  shade ({subdivisions}x{subdivisions}, {} verts, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}",
        out.len()
    );
}

fn bench_lattice_heights(subdivisions: u32, iterations: usize) {
    let mesh = TerrainMesh::new(15.0, 15.0, subdivisions).expect("valid grid");
    let params = NoiseParameters::default();

    let start = Instant::now();
    let mut checksum = 0.0f32;
    for _ in 0..iterations {
        let heights = mesh.lattice_heights(black_box(&params), Vec2::ZERO);
        checksum += heights[heights.len() / 2];
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  lattice heights ({subdivisions}x{subdivisions}, {iterations} iters): {per_iter:?}/iter (checksum {checksum:.3})"
    );
}

fn main() {
    println!("terrain shading benchmarks");
    for (n, iters) in [(64, 50), (128, 20), (256, 5)] {
        bench_shade(n, iters);
    }
    for (n, iters) in [(128, 20), (256, 5)] {
        bench_lattice_heights(n, iters);
    }
}
