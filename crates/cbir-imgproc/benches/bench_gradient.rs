use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

use cbir_image::{Image, ImageSize};
use cbir_imgproc::{filter, histogram};

fn bench_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpatialGradient");
    let mut rng = rand::rng();

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{width}x{height}");

        let size = ImageSize {
            width: *width,
            height: *height,
        };
        let data = (0..size.area())
            .map(|_| rng.random_range(0.0..255.0))
            .collect::<Vec<f32>>();
        let image = Image::<f32, 1>::new(size, data).unwrap();
        let output_dx = Image::<f32, 1>::from_size_val(size, 0.0).unwrap();
        let output_dy = Image::<f32, 1>::from_size_val(size, 0.0).unwrap();

        group.bench_with_input(
            BenchmarkId::new("spatial_gradient", &parameter_string),
            &(&image, &output_dx, &output_dy),
            |b, i| {
                let (src, mut dx, mut dy) = (i.0, i.1.clone(), i.2.clone());
                b.iter(|| black_box(filter::spatial_gradient(src, &mut dx, &mut dy, 3)))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("histogram_1d", &parameter_string),
            &image,
            |b, i| b.iter(|| black_box(histogram::histogram_1d(i, 16, 255.0))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_gradient);
criterion_main!(benches);
