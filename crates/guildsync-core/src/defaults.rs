//! Built-in seed data used when neither the local store nor the remote has
//! anything to offer.

use serde_json::{json, Map, Value};

use crate::models::{Collection, CollectionName, Record, MEMBER_ACTIVE_STATUS};

/// `lastUpdated` of the seed roster, one tick after the founding member joined.
const SEED_MEMBERS_UPDATED: i64 = 1_704_067_200_003;

/// Supplies a well-formed collection for any name. Must never fail.
pub trait DefaultProvider: Send + Sync {
    fn default_collection(&self, name: CollectionName, now: i64) -> Collection;
}

/// The guild's shipped defaults: no photos, and the founding officers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedData;

impl DefaultProvider for SeedData {
    fn default_collection(&self, name: CollectionName, now: i64) -> Collection {
        match name {
            CollectionName::Photos => Collection::empty(name, now),
            CollectionName::Members => Collection::new(name, seed_members(), SEED_MEMBERS_UPDATED),
        }
    }
}

struct SeedMember {
    id: &'static str,
    name: &'static str,
    role: &'static str,
    avatar: &'static str,
    cover: &'static str,
    join_date: i64,
    description: &'static str,
    tags: [&'static str; 3],
    email: &'static str,
    profile: SeedProfile,
}

struct SeedProfile {
    bio: &'static str,
    interests: [&'static str; 3],
    game_level: i64,
    favorite_activity: &'static str,
}

const SEED_MEMBERS: [SeedMember; 5] = [
    SeedMember {
        id: "member-001",
        name: "작은음표",
        role: "길드마스터",
        avatar: "라",
        cover: "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=400&h=250&fit=crop",
        join_date: 1_704_067_200_000,
        description: "NBTI 길드의 길드마스터",
        tags: ["길드마스터", "리더", "던전"],
        email: "smallnote@nbti.com",
        profile: SeedProfile {
            bio: "NBTI 길드의 길드마스터입니다. 함께 즐거운 게임을 해요!",
            interests: ["던전", "레이드", "길드 관리"],
            game_level: 60,
            favorite_activity: "던전 공략",
        },
    },
    SeedMember {
        id: "member-002",
        name: "아쉬운데잉",
        role: "부길드장",
        avatar: "아",
        cover: "https://images.unsplash.com/photo-1519904981063-b0cf448d479e?w=400&h=250&fit=crop",
        join_date: 1_703_980_800_000,
        description: "부길드장",
        tags: ["부길드장", "서포터", "정모"],
        email: "ashy@nbti.com",
        profile: SeedProfile {
            bio: "부길드장으로 길드원들을 도와드립니다!",
            interests: ["정모", "친목", "서포터"],
            game_level: 58,
            favorite_activity: "길드원들과의 정모",
        },
    },
    SeedMember {
        id: "member-003",
        name: "돌하나",
        role: "부길드장",
        avatar: "돌",
        cover: "https://images.unsplash.com/photo-1511632765486-a01980e01a18?w=400&h=250&fit=crop",
        join_date: 1_703_894_400_000,
        description: "부길드장",
        tags: ["부길드장", "레이드", "친목"],
        email: "dol@nbti.com",
        profile: SeedProfile {
            bio: "부길드장으로 활발하게 활동합니다!",
            interests: ["레이드", "친목", "게임"],
            game_level: 55,
            favorite_activity: "레이드 파티",
        },
    },
    SeedMember {
        id: "member-004",
        name: "전사도로롱",
        role: "부길드장",
        avatar: "전",
        cover: "",
        join_date: 1_703_808_000_000,
        description: "부길드장",
        tags: ["부길드장", "전사", "친화력"],
        email: "doro@nbti.com",
        profile: SeedProfile {
            bio: "전사 부길드장입니다. 잘 부탁드려요!",
            interests: ["전사", "게임", "학습"],
            game_level: 45,
            favorite_activity: "길드원들과의 대화",
        },
    },
    SeedMember {
        id: "member-005",
        name: "이시후",
        role: "길드원",
        avatar: "이",
        cover: "",
        join_date: 1_703_721_600_000,
        description: "길드원",
        tags: ["길드원", "게임", "커뮤니티"],
        email: "sihu@nbti.com",
        profile: SeedProfile {
            bio: "게임과 커뮤니티 활동을 좋아하는 길드원입니다.",
            interests: ["게임", "커뮤니티", "친목"],
            game_level: 52,
            favorite_activity: "커뮤니티 활동",
        },
    },
];

fn seed_members() -> Vec<Record> {
    SEED_MEMBERS
        .iter()
        .map(|m| {
            let mut fields = Map::new();
            fields.insert("name".into(), Value::from(m.name));
            fields.insert("role".into(), Value::from(m.role));
            fields.insert("avatar".into(), Value::from(m.avatar));
            fields.insert("cover".into(), Value::from(m.cover));
            fields.insert("joinDate".into(), Value::from(m.join_date));
            fields.insert("status".into(), Value::from(MEMBER_ACTIVE_STATUS));
            fields.insert("description".into(), Value::from(m.description));
            fields.insert("tags".into(), string_array(&m.tags));
            fields.insert("email".into(), Value::from(m.email));
            fields.insert("lastLogin".into(), Value::from(0));
            fields.insert(
                "profile".into(),
                json!({
                    "bio": m.profile.bio,
                    "interests": string_array(&m.profile.interests),
                    "gameLevel": m.profile.game_level,
                    "favoriteActivity": m.profile.favorite_activity,
                }),
            );
            Record::with_id(m.id, fields)
        })
        .collect()
}

fn string_array(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|&v| Value::from(v)).collect())
}
