use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// A preset clothing image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outfit {
    pub url: String,
    pub name: String,
}

const MALE: &[(&str, &str)] = &[
    ("/outfits/male/black-tshirt.png", "Черная футболка"),
    ("/outfits/male/white-shirt.png", "Белая рубашка"),
    ("/outfits/male/denim-jacket.png", "Джинсовая куртка"),
    ("/outfits/male/grey-hoodie.png", "Серое худи"),
    ("/outfits/male/navy-blazer.png", "Темно-синий пиджак"),
];

const FEMALE: &[(&str, &str)] = &[
    ("/outfits/female/red-dress.png", "Красное платье"),
    ("/outfits/female/white-blouse.png", "Белая блузка"),
    ("/outfits/female/black-tshirt.png", "Черная футболка"),
    ("/outfits/female/beige-trench.png", "Бежевый тренч"),
    ("/outfits/female/knit-sweater.png", "Вязаный свитер"),
];

/// Fixed outfit catalog with URLs resolved against a base.
#[derive(Debug, Clone)]
pub struct Gallery {
    male: Vec<Outfit>,
    female: Vec<Outfit>,
}

impl Gallery {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let resolve = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(path, name)| Outfit {
                    url: format!("{}{}", base, path),
                    name: name.to_string(),
                })
                .collect()
        };
        Self {
            male: resolve(MALE),
            female: resolve(FEMALE),
        }
    }

    pub fn outfits(&self, gender: Gender) -> &[Outfit] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }

    pub fn find_by_url(&self, gender: Gender, url: &str) -> Option<&Outfit> {
        self.outfits(gender).iter().find(|o| o.url == url)
    }

    pub fn find_by_name(&self, gender: Gender, name: &str) -> Option<&Outfit> {
        self.outfits(gender).iter().find(|o| o.name == name)
    }
}
