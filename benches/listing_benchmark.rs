use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hotel_search_bot::api::{Address, Landmark, Listing, RatePlan, RatePrice};
use hotel_search_bot::search::{format_listing, parse_distance};
use hotel_search_bot::Locale;
use rand::Rng;

fn random_distances(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let value: f64 = rng.gen_range(0.0..25.0);
            if rng.gen_bool(0.5) {
                format!("{:.1} miles", value)
            } else {
                format!("{:.1} км", value).replace('.', ",")
            }
        })
        .collect()
}

fn sample_listing(distance: &str) -> Listing {
    Listing {
        name: "Hotel Budapest".to_string(),
        address: Address {
            country_name: "Russia".to_string(),
            locality: "Moscow".to_string(),
            street_address: Some("Petrovskiye Linii, 2".to_string()),
        },
        landmarks: vec![Landmark {
            label: "City center".to_string(),
            distance: distance.to_string(),
        }],
        rate_plan: Some(RatePlan {
            price: RatePrice {
                current: "$98".to_string(),
            },
        }),
    }
}

pub fn listing_benchmark(c: &mut Criterion) {
    let distances = random_distances(1000);
    let listings: Vec<Listing> = distances.iter().map(|d| sample_listing(d)).collect();

    c.bench_function("parse_distance", |b| {
        b.iter(|| {
            for raw in &distances {
                black_box(parse_distance(black_box(raw)));
            }
        })
    });

    c.bench_function("format_listing", |b| {
        b.iter(|| {
            for listing in &listings {
                let distance = listing.landmark_distance().and_then(parse_distance);
                black_box(format_listing(listing, distance, Locale::EnUs));
            }
        })
    });
}

criterion_group!(benches, listing_benchmark);
criterion_main!(benches);
