//! Publisher identification by URL substring.

use serde::Serialize;

/// Stable tag for each known publisher, used to pick an extraction adapter.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteId {
    BbcGoodFood,
    BbcFood,
    Tastemade,
    NyonyaCooking,
    NytCooking,
    HappyFoodie,
    GoodTo,
    TipHero,
    FoodCom,
    JanesPatisserie,
    Makan,
    MyThirtySpot,
    Hemsley,
    DonalSkehan,
    NatashasKitchen,
    JoyOfBaking,
    AllRecipes,
    VisitCroatia,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub id: SiteId,
    pub identity_patterns: &'static [&'static str],
    pub display_name: &'static str,
}

impl SiteProfile {
    pub fn matches(&self, url: &str) -> bool {
        self.identity_patterns.iter().any(|p| url.contains(p))
    }

    pub fn is_generic(&self) -> bool {
        self.id == SiteId::Generic
    }
}

const fn site(
    id: SiteId,
    identity_patterns: &'static [&'static str],
    display_name: &'static str,
) -> SiteProfile {
    SiteProfile {
        id,
        identity_patterns,
        display_name,
    }
}

pub static GENERIC: SiteProfile = site(SiteId::Generic, &[], "Generic Recipe Site");

/// Registration order is significant: the first matching profile wins, so
/// `bbcgoodfood.com` has to come before `food.com`.
pub static SITES: &[SiteProfile] = &[
    site(SiteId::BbcGoodFood, &["bbcgoodfood.com"], "BBC Good Food"),
    site(SiteId::BbcFood, &["bbc.co.uk/food"], "BBC Food"),
    site(SiteId::Tastemade, &["tastemade.com"], "Tastemade"),
    site(SiteId::NyonyaCooking, &["nyonyacooking.com"], "Nyonya Cooking"),
    site(SiteId::NytCooking, &["cooking.nytimes.com"], "NYT Cooking"),
    site(SiteId::HappyFoodie, &["thehappyfoodie.co.uk"], "The Happy Foodie"),
    site(SiteId::GoodTo, &["goodto.com", "goodtoknow.co.uk"], "Good To"),
    site(SiteId::TipHero, &["tiphero.com"], "Tip Hero"),
    site(SiteId::FoodCom, &["food.com"], "Food.com"),
    site(SiteId::JanesPatisserie, &["janespatisserie.com"], "Janes Patisserie"),
    site(SiteId::Makan, &["makan.ch"], "Makan"),
    site(SiteId::MyThirtySpot, &["mythirtyspot.com"], "My Thirty Spot"),
    site(SiteId::Hemsley, &["hemsleyandhemsley.com"], "Hemsley and Hemsley"),
    site(SiteId::DonalSkehan, &["donalskehan.com"], "Donal Skehan"),
    site(SiteId::NatashasKitchen, &["natashaskitchen.com"], "Natashas Kitchen"),
    site(SiteId::JoyOfBaking, &["joyofbaking.com"], "Joy of Baking"),
    site(SiteId::AllRecipes, &["allrecipes.com", "allrecipes.co.uk"], "AllRecipes"),
    site(SiteId::VisitCroatia, &["visit-croatia.co.uk"], "Visit Croatia"),
];

/// Find the publisher for a URL. Never fails; unknown URLs get [`GENERIC`].
pub fn classify(url: &str) -> &'static SiteProfile {
    SITES.iter().find(|s| s.matches(url)).unwrap_or(&GENERIC)
}

/// Whether the URL belongs to one of the registered publishers.
pub fn is_registered(url: &str) -> bool {
    !classify(url).is_generic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_publishers() {
        assert_eq!(
            classify("https://www.bbcgoodfood.com/recipes/chicken").id,
            SiteId::BbcGoodFood
        );
        assert_eq!(
            classify("https://www.bbc.co.uk/food/recipes/pie_123").id,
            SiteId::BbcFood
        );
        assert_eq!(
            classify("https://cooking.nytimes.com/recipes/1015819").display_name,
            "NYT Cooking"
        );
        assert_eq!(classify("https://www.goodtoknow.co.uk/x").id, SiteId::GoodTo);
        assert_eq!(classify("https://www.allrecipes.co.uk/x").id, SiteId::AllRecipes);
    }

    #[test]
    fn test_first_registered_match_wins() {
        // Also contains "food.com"
        let url = "https://www.bbcgoodfood.com/recipes/apple-pie";
        assert!(SITES[8].matches(url));
        assert_eq!(classify(url).id, SiteId::BbcGoodFood);
        assert_eq!(classify("https://food.com/apam-balik").id, SiteId::FoodCom);
    }

    #[test]
    fn test_unknown_url_is_generic() {
        let profile = classify("https://example.org/best-brownies");
        assert!(profile.is_generic());
        assert_eq!(profile.display_name, "Generic Recipe Site");
        assert!(!is_registered("https://example.org/best-brownies"));
        assert!(classify("").is_generic());
    }

    #[test]
    fn test_classify_is_deterministic() {
        let urls = [
            "https://www.tastemade.com/recipes/x",
            "https://example.org/y",
            "https://food.com/z",
        ];
        for url in urls {
            assert_eq!(classify(url), classify(url));
        }
    }

    #[test]
    fn test_raw_url_is_not_normalized() {
        // Matching is case sensitive on the raw string
        assert!(classify("https://FOOD.COM/x").is_generic());
    }
}
