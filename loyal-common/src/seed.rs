//! Sample people for an empty map

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::geo::{GeoPoint, RegionBounds};
use crate::model::{Gender, NewPerson};
use crate::store::PersonStore;
use crate::Result;

const BOY_NAMES: &[&str] = &[
    "Rakib Hasan", "Tanvir Ahmed", "Shahin Alam", "Mehedi Hasan", "Arif Rahman",
    "Jubayer Khan", "Sakib Hossain", "Nayeem Islam", "Farhan Kabir", "Imran Hossain",
    "Rifat Uddin", "Shanto Das", "Tushar Ahmed", "Rahim Mia", "Kamal Hossain",
    "Jahid Hasan", "Sohag Mia", "Badhon Islam", "Sumon Sheikh", "Nahid Hasan",
];

const GIRL_NAMES: &[&str] = &[
    "Fatima Akter", "Nusrat Jahan", "Tasnim Rahman", "Ayesha Siddiqua", "Mariam Begum",
    "Lamia Islam", "Sumaiya Akter", "Rabeya Khatun", "Jannatul Ferdous", "Maliha Ahmed",
    "Sadia Islam", "Tamanna Akter", "Nafisa Rahman", "Bristy Das", "Rima Begum",
    "Papiya Khatun", "Sharna Islam", "Tania Sultana", "Mitu Akter", "Reshma Begum",
];

const DHAKA_AREAS: &[&str] = &[
    "Dhanmondi", "Gulshan", "Banani", "Mirpur", "Uttara", "Mohammadpur",
    "Motijheel", "Farmgate", "Shahbag", "Tejgaon", "Badda", "Rampura",
    "Khilgaon", "Bashundhara R/A", "Jatrabari", "Demra", "Gabtoli", "Pallabi",
    "Kafrul", "Cantonment", "Lalmatia", "Elephant Road", "New Market",
    "Old Dhaka", "Wari", "Lalbagh", "Azimpur",
];

const LOYALTY_QUOTES: &[&str] = &[
    "Never texted anyone else 💚",
    "Waiting since 2019 🥺",
    "Only has eyes for bae 👀",
    "Phone password is partner's birthday 🔐",
    "Still uses couple DP 💑",
    "Rejected 47 proposals 💪",
    "Carries partner's photo in wallet 🪪",
    "Writes love letters in 2024 💌",
    "Never liked anyone else's photo 📱",
    "Goes offline at 10pm for bae 🌙",
];

/// Half-width in degrees of the box around the region center people are
/// scattered in (roughly the city)
const SCATTER_DEG: f64 = 0.08;

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// `count` random people near the region center, all inside the region
pub fn generate_people<R: Rng>(rng: &mut R, count: usize, region: &RegionBounds) -> Vec<NewPerson> {
    let lat_lo = (region.center.lat - SCATTER_DEG).max(region.min_lat);
    let lat_hi = (region.center.lat + SCATTER_DEG).min(region.max_lat);
    let lng_lo = (region.center.lng - SCATTER_DEG).max(region.min_lng);
    let lng_hi = (region.center.lng + SCATTER_DEG).min(region.max_lng);

    (0..count)
        .map(|_| {
            let gender = if rng.gen_bool(0.5) { Gender::Boy } else { Gender::Girl };
            let names = match gender {
                Gender::Boy => BOY_NAMES,
                Gender::Girl => GIRL_NAMES,
            };
            NewPerson {
                name: pick(rng, names).to_string(),
                gender,
                area: pick(rng, DHAKA_AREAS).to_string(),
                quote: pick(rng, LOYALTY_QUOTES).to_string(),
                social_media_link: None,
                location: GeoPoint::new(rng.gen_range(lat_lo..=lat_hi), rng.gen_range(lng_lo..=lng_hi)),
            }
        })
        .collect()
}

/// Insert `count` generated people; stops at the first store error
pub async fn seed_store(store: &dyn PersonStore, count: usize, region: &RegionBounds) -> Result<usize> {
    let people = generate_people(&mut rand::thread_rng(), count, region);
    for person in &people {
        store.insert(person).await?;
    }
    info!(count = people.len(), backend = store.backend(), "Seeded sample people");
    Ok(people.len())
}
