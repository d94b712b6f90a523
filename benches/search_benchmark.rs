use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId};
use crozzle_generator::{generator::{GeneratorSettings, NextStepGenerator}, runner::{CancellationFlag, Runner}, settings::SearchSettings, word_database::WordDatabase, workspace::Workspace};
use tokio::runtime::Builder;
use tokio_stream::StreamExt;

const WORDS: [&str; 14] = ["HELLO", "WORLD", "LOCAL", "OCTAL", "TAXI", "AXE", "HALO", "CAT", "OAK", "ZOO", "JAZZ", "QUIZ", "YELLOW", "SESAME"];

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("crozzle");
    let db = WordDatabase::new(WORDS);
    let seeds = Workspace::seeds(&db);

    for (name, settings) in [("SlotFilling", GeneratorSettings::default()), ("SpaceFilling", GeneratorSettings::space_filling())]
    {
        let generator = settings.build();
        group.bench_function(BenchmarkId::new("Expand seeds", name),
            |b| b.iter(|| seeds.iter().map(|ws| generator.generate_next_steps(ws).count()).sum::<usize>()));

        let search = SearchSettings { generator: settings, queue_capacity: 200, flush_length: 50, ..Default::default() };
        group.bench_function(BenchmarkId::new("First 50 solutions", name),
            |b| b.iter(||
            {
                let rt = Builder::new_current_thread().build().unwrap();
                let runner = Runner::from_settings(search.clone()).unwrap();

                rt.block_on(async
                {
                    let stream = runner.solve_words(db.clone(), CancellationFlag::new());
                    stream.take(50).collect::<Vec<_>>().await
                })
            }));
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
