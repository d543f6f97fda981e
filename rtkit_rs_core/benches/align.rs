use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rtkit_core::toolkit::{
    align::{alignmk, AlignOptions, Direction},
    column::Column,
};

fn sorted_times(len: usize) -> Column {
    let mut times = Array1::<i64>::random(len, Uniform::new(0, 1_000_000_000)).to_vec();
    times.sort_unstable();
    Column::from(Array1::from(times))
}

macro_rules! bench_alignmk {
    ($c:expr, $len:expr, $cardinality:expr) => {{
        let key1 = Column::from(Array1::<i32>::random($len, Uniform::new(0, $cardinality)));
        let key2 = Column::from(Array1::<i32>::random($len, Uniform::new(0, $cardinality)));
        let time1 = sorted_times($len);
        let time2 = sorted_times($len);
        for direction in [Direction::Backward, Direction::Forward] {
            let name = format!(
                "alignmk ({direction}) ({} rows, {} keys)",
                $len, $cardinality
            );
            $c.bench_function(&name, |b| {
                b.iter(|| {
                    alignmk(
                        black_box(key1.clone()),
                        black_box(key2.clone()),
                        black_box(&time1),
                        black_box(&time2),
                        AlignOptions::new(direction),
                    )
                })
            });
        }
    }};
}

pub fn bench_align(c: &mut Criterion) {
    bench_alignmk!(c, 100_000, 10);
    bench_alignmk!(c, 100_000, 10_000);
    bench_alignmk!(c, 1_000_000, 1_000);
}

criterion_group!(benches, bench_align);
criterion_main!(benches);
