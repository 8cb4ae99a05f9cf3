use criterion::{criterion_group, criterion_main, Criterion};
use maplibre_markers::{
    coords::{LngLat, ZoomLevel},
    MarkerManager, Scene,
};

fn circle(points: usize) -> Vec<LngLat> {
    (0..points)
        .map(|i| {
            let angle = i as f64 / points as f64 * std::f64::consts::TAU;
            LngLat::new(11.5 + 0.1 * angle.cos(), 48.1 + 0.1 * angle.sin())
        })
        .collect()
}

fn polyline(c: &mut Criterion) {
    let coordinates = circle(512);
    let mut manager = MarkerManager::new(Scene::default());
    let id = manager.add(
        r##"{"style": "lines", "color": "#3388ff", "width": ["interpolate", ["linear"], ["zoom"], 10, 1, 15, 4], "join": "round"}"##,
    );

    c.bench_function("set_polyline", |b| {
        b.iter(|| manager.set_polyline(id, &coordinates).unwrap())
    });
}

fn polygon(c: &mut Criterion) {
    let coordinates = circle(512);
    let mut manager = MarkerManager::new(Scene::default());
    let id = manager.add(r##"{"style": "polygons", "color": "#ff8800", "outline": {"width": 2}}"##);

    c.bench_function("set_polygon", |b| {
        b.iter(|| manager.set_polygon(id, &coordinates, &[512]).unwrap())
    });
}

fn update(c: &mut Criterion) {
    let mut manager = MarkerManager::new(Scene::default());
    for i in 0..100 {
        let id = manager.add(r#"{"style": "lines", "width": {"stops": [[10, 1], [16, 6]]}}"#);
        let offset = i as f64 * 0.01;
        manager
            .set_polyline(
                id,
                &[
                    LngLat::new(11.5 + offset, 48.1),
                    LngLat::new(11.6 + offset, 48.2),
                    LngLat::new(11.7 + offset, 48.1),
                ],
            )
            .unwrap();
    }

    let mut zoom = 10;
    c.bench_function("update_100_markers", |b| {
        b.iter(|| {
            zoom = if zoom == 16 { 10 } else { zoom + 1 };
            manager.update(ZoomLevel::new(zoom))
        })
    });
}

criterion_group!(benches, polyline, polygon, update);
criterion_main!(benches);
