use crate::models::{CharacterProfile, VisualProfile};
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use rand::Rng;
use regex::Regex;
use serde_json::{json, Map, Value};

pub const HAIRSTYLES: [&str; 3] = [
    "짧고 단정한 까만 머리",
    "어깨에 닿는 찰랑이는 갈색 단발머리",
    "양 갈래로 묶은 까만 머리",
];

pub const OUTFITS: [&str; 3] = [
    "노란 후드티와 파란 반바지",
    "빨간 줄무늬 티셔츠와 청멜빵바지",
    "연두색 원피스와 하얀 운동화",
];

const FACE: &str = "동그란 얼굴에 발그레한 볼";
const EYES: &str = "크고 반짝이는 까만 눈";
const PROPORTIONS: &str = "머리가 크고 팔다리가 짧은 귀여운 그림책 어린이 비율";
const STYLE: &str = "따뜻한 수채화 그림책 일러스트";

static DESCRIPTOR_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)canonical\s+visual\s+descriptor\s*[:：\-]?[ \t]*([^\r\n]*)")
        .expect("descriptor label pattern is valid")
});

pub(crate) fn child_word(gender: &str) -> &'static str {
    match gender.trim().to_lowercase().as_str() {
        "male" | "m" | "boy" | "남" | "남자" | "남아" | "남자아이" => "남자아이",
        "female" | "f" | "girl" | "여" | "여자" | "여아" | "여자아이" => "여자아이",
        _ => "아이",
    }
}

/// Builds a fresh profile with a random hairstyle and outfit. Every call picks again, so
/// two stories for the same child may look different while one story stays consistent.
pub fn build_character_profile(name: &str, age: &str, gender: &str) -> CharacterProfile {
    build_character_profile_with(&mut rand::rng(), name, age, gender)
}

pub fn build_character_profile_with<R: Rng + ?Sized>(
    rng: &mut R,
    name: &str,
    age: &str,
    gender: &str,
) -> CharacterProfile {
    let hair = HAIRSTYLES.choose(&mut *rng).copied().unwrap_or(HAIRSTYLES[0]);
    let outfit = OUTFITS.choose(&mut *rng).copied().unwrap_or(OUTFITS[0]);

    let canonical = format!(
        "{}살 {} {}, {}, {} 차림, {}, {}, {}",
        age,
        child_word(gender),
        name,
        hair,
        outfit,
        FACE,
        EYES,
        PROPORTIONS
    );

    let profile = CharacterProfile {
        name: name.to_string(),
        age: age.to_string(),
        gender: gender.to_string(),
        style: STYLE.to_string(),
        visual: VisualProfile {
            canonical,
            hair: hair.to_string(),
            outfit: outfit.to_string(),
            face: FACE.to_string(),
            eyes: EYES.to_string(),
            proportions: PROPORTIONS.to_string(),
        },
    };

    log::info!(
        "Built character profile: {}",
        serde_json::to_string(&profile).unwrap_or_default()
    );
    profile
}

/// Accepts a profile as an object, a JSON-encoded string, or free text carrying a
/// "Canonical Visual Descriptor" line. Empty input yields `None`.
pub fn ensure_character_profile(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => Some(value.clone()),
        Value::String(text) => profile_from_text(text),
        _ => None,
    }
}

fn profile_from_text(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Some(Value::Object(map));
    }

    let canonical = DESCRIPTOR_LABEL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|rest| !rest.is_empty())
        .unwrap_or(text);

    Some(json!({
        "name": "",
        "age": "",
        "gender": "",
        "style": "",
        "visual": {
            "canonical": canonical,
            "hair": "",
            "outfit": "",
            "face": "",
            "eyes": "",
            "proportions": "",
        }
    }))
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Reads a normalized profile leniently: numbers are kept as text, other non-string fields
/// become empty strings, and a bare string under `visual` is taken as the canonical descriptor.
pub fn profile_from_value(value: &Value) -> CharacterProfile {
    let empty = Map::new();
    let map = value.as_object().unwrap_or(&empty);

    let visual = match map.get("visual") {
        Some(Value::Object(visual)) => VisualProfile {
            canonical: text_field(visual, "canonical"),
            hair: text_field(visual, "hair"),
            outfit: text_field(visual, "outfit"),
            face: text_field(visual, "face"),
            eyes: text_field(visual, "eyes"),
            proportions: text_field(visual, "proportions"),
        },
        Some(Value::String(canonical)) => VisualProfile {
            canonical: canonical.clone(),
            ..Default::default()
        },
        _ => VisualProfile::default(),
    };

    CharacterProfile {
        name: text_field(map, "name"),
        age: text_field(map, "age"),
        gender: text_field(map, "gender"),
        style: text_field(map, "style"),
        visual,
    }
}
