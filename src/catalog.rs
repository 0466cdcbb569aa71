use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::Error;

/// The catalog asset compiled into this crate.
///
/// Version and last-updated tags travel with the data, so consumers can
/// report what vintage of reference data they are showing.
const BUNDLED_JSON: &str = include_str!("../data/catalog.json");

static BUNDLED: OnceLock<Catalog> = OnceLock::new();

/// An immutable hierarchy of continents, countries and cities, where every
/// city is keyed to an IANA time zone identifier.
///
/// A catalog is loaded once and never mutated. All lookups borrow from it,
/// and it is safe to share across threads. Iteration order everywhere is the
/// order the data was authored in, which is what gives
/// [`reverse_lookup`](crate::reverse_lookup) its documented first-match
/// semantics.
///
/// Time zone identifiers are carried as opaque strings. The catalog does not
/// validate them; they are expected to be resolvable by the platform time
/// zone database when a clock is actually rendered.
#[derive(Clone, Debug, Deserialize)]
pub struct Catalog {
    version: String,
    last_updated: String,
    continents: Vec<Continent>,
    #[serde(default)]
    anomalies: Vec<(String, String)>,
}

impl Catalog {
    /// Returns the catalog bundled with this crate, parsing it on first use.
    ///
    /// # Example
    ///
    /// ```
    /// use world_clock::Catalog;
    ///
    /// let catalog = Catalog::bundled();
    /// assert!(catalog.continent("North America").is_some());
    /// ```
    pub fn bundled() -> &'static Catalog {
        BUNDLED.get_or_init(|| {
            // The bundled asset is fixed at compile time and covered by
            // tests, so a decode failure here is a defect in the crate
            // itself, not a runtime condition.
            let catalog = Catalog::from_json(BUNDLED_JSON)
                .expect("bundled catalog asset is valid");
            debug!(
                "loaded bundled location catalog \
                 (version {}, updated {}, {} continents, {} cities)",
                catalog.version,
                catalog.last_updated,
                catalog.continents.len(),
                catalog
                    .continents
                    .iter()
                    .flat_map(|c| c.countries.iter())
                    .map(|c| c.cities.len())
                    .sum::<usize>(),
            );
            catalog
        })
    }

    /// Decodes a catalog from its JSON serialization.
    pub fn from_json(json: &str) -> Result<Catalog, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::parse("location catalog", e))
    }

    /// The version tag that travels with the catalog data.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The date (free text) the catalog data was last revised.
    pub fn last_updated(&self) -> &str {
        &self.last_updated
    }

    /// All continents, in authored order.
    pub fn continents(&self) -> &[Continent] {
        &self.continents
    }

    /// Looks up a continent by name.
    pub fn continent(&self, name: &str) -> Option<&Continent> {
        self.continents.iter().find(|c| c.name == name)
    }

    /// Returns the time zone anomaly annotation for a country, if the
    /// catalog carries one.
    ///
    /// Anomaly entries are indexed separately from the country nodes and may
    /// name countries (or regions, like Antarctica) that have no node at
    /// all.
    pub fn anomaly_for(&self, country: &str) -> Option<&str> {
        self.anomalies
            .iter()
            .find(|(name, _)| name == country)
            .map(|(_, text)| text.as_str())
    }
}

/// A continent node: a name and its countries, in authored order.
#[derive(Clone, Debug, Deserialize)]
pub struct Continent {
    name: String,
    countries: Vec<Country>,
}

impl Continent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn country(&self, name: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.name == name)
    }
}

/// A country node.
///
/// Cities live in their own sequence, distinct from the population ordering
/// and the metadata record, so no lookup ever needs to ask whether a key is
/// "really" a city.
#[derive(Clone, Debug, Deserialize)]
pub struct Country {
    name: String,
    cities: Vec<City>,
    #[serde(default)]
    population_order: Vec<String>,
    #[serde(default)]
    metadata: CountryMetadata,
}

impl Country {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All cities, in authored order.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.name == name)
    }

    /// The curated population ranking. Partial: cities absent from this list
    /// simply have no rank.
    pub fn population_order(&self) -> &[String] {
        &self.population_order
    }

    /// The 1-based position of a city in the population ordering, or `None`
    /// when the city is unranked.
    pub fn population_rank(&self, city: &str) -> Option<u32> {
        self.population_order
            .iter()
            .position(|name| name == city)
            .map(|idx| idx as u32 + 1)
    }

    /// Cities ordered for display: ranked cities first in ranking order,
    /// then unranked cities alphabetically among themselves.
    pub fn cities_by_population(&self) -> Vec<&City> {
        let mut cities: Vec<&City> = self.cities.iter().collect();
        cities.sort_by(|a, b| {
            let rank_a = self.population_rank(&a.name).unwrap_or(u32::MAX);
            let rank_b = self.population_rank(&b.name).unwrap_or(u32::MAX);
            rank_a.cmp(&rank_b).then_with(|| a.name.cmp(&b.name))
        });
        cities
    }

    pub fn metadata(&self) -> &CountryMetadata {
        &self.metadata
    }
}

/// A city node: a display name and the IANA time zone identifier every
/// wall-clock computation for that city routes through.
#[derive(Clone, Debug, Deserialize)]
pub struct City {
    name: String,
    timezone: String,
    #[serde(default)]
    details: Option<CityDetails>,
}

impl City {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Administrative annotations, carried only by a handful of cities in
    /// large countries.
    pub fn details(&self) -> Option<&CityDetails> {
        self.details.as_ref()
    }
}

/// Per-city administrative annotations: state or province, broad region,
/// metro population and free-text zone notes. All optional, and most cities
/// carry none at all.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct CityDetails {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    province: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    metro_population: Option<u64>,
    #[serde(default)]
    notes: Option<String>,
}

impl CityDetails {
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn province(&self) -> Option<&str> {
        self.province.as_deref()
    }

    /// The state or province, whichever the source data uses for this
    /// country.
    pub fn subdivision(&self) -> Option<&str> {
        self.state.as_deref().or(self.province.as_deref())
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn metro_population(&self) -> Option<u64> {
        self.metro_population
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Free-text annotations attached to a country node. All optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CountryMetadata {
    #[serde(default)]
    largest_city: Option<String>,
    #[serde(default)]
    timezone_notes: Option<String>,
    #[serde(default)]
    special_status: Option<String>,
}

impl CountryMetadata {
    pub fn largest_city(&self) -> Option<&str> {
        self.largest_city.as_deref()
    }

    pub fn timezone_notes(&self) -> Option<&str> {
        self.timezone_notes.as_deref()
    }

    pub fn special_status(&self) -> Option<&str> {
        self.special_status.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_asset_decodes() {
        let _ = env_logger::try_init();

        let catalog = Catalog::bundled();
        assert_eq!(catalog.version(), "2.0.0");
        assert_eq!(catalog.last_updated(), "2024-01-20");
        assert!(!catalog.continents().is_empty());
    }

    #[test]
    fn every_city_has_a_timezone() {
        for continent in Catalog::bundled().continents() {
            for country in continent.countries() {
                assert!(!country.cities().is_empty(), "{}", country.name());
                for city in country.cities() {
                    assert!(
                        !city.timezone().is_empty(),
                        "{} / {} / {}",
                        continent.name(),
                        country.name(),
                        city.name(),
                    );
                }
            }
        }
    }

    #[test]
    fn population_order_names_real_cities() {
        for continent in Catalog::bundled().continents() {
            for country in continent.countries() {
                for name in country.population_order() {
                    assert!(
                        country.city(name).is_some(),
                        "{} ranks unknown city {name}",
                        country.name(),
                    );
                }
            }
        }
    }

    #[test]
    fn population_rank_is_one_based() {
        let us = Catalog::bundled()
            .continent("North America")
            .unwrap()
            .country("United States")
            .unwrap();
        assert_eq!(us.population_rank("New York"), Some(1));
        assert_eq!(us.population_rank("Los Angeles"), Some(2));
        assert_eq!(us.population_rank("Springfield"), None);
    }

    #[test]
    fn display_order_puts_unranked_cities_last() {
        // Kenya lists Nakuru as a city but leaves it out of the population
        // ordering, so it sorts after every ranked city.
        let kenya = Catalog::bundled()
            .continent("Africa")
            .unwrap()
            .country("Kenya")
            .unwrap();
        let ordered: Vec<&str> =
            kenya.cities_by_population().iter().map(|c| c.name()).collect();
        assert_eq!(ordered, vec!["Nairobi", "Mombasa", "Kisumu", "Nakuru"]);
    }

    #[test]
    fn anomaly_lookup() {
        let catalog = Catalog::bundled();
        assert_eq!(
            catalog.anomaly_for("Nepal"),
            Some("UTC+5:45, one of the few zones offset by 45 minutes"),
        );
        // Antarctica has an anomaly entry but no country node.
        assert!(catalog.anomaly_for("Antarctica").is_some());
        assert_eq!(catalog.anomaly_for("Japan"), None);
    }

    #[test]
    fn bundled_asset_covers_the_full_dataset() {
        let catalog = Catalog::bundled();
        let countries: usize =
            catalog.continents().iter().map(|c| c.countries().len()).sum();
        let cities: usize = catalog
            .continents()
            .iter()
            .flat_map(|c| c.countries())
            .map(|c| c.cities().len())
            .sum();
        assert!(countries >= 170, "only {countries} countries");
        assert!(cities >= 700, "only {cities} cities");

        let africa = catalog.continent("Africa").unwrap();
        for name in ["Tanzania", "Sudan", "Angola", "Tunisia"] {
            assert!(africa.country(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn city_details_where_present() {
        let us = Catalog::bundled()
            .continent("North America")
            .unwrap()
            .country("United States")
            .unwrap();
        let nyc = us.city("New York").unwrap().details().unwrap();
        assert_eq!(nyc.state(), Some("New York"));
        assert_eq!(nyc.subdivision(), Some("New York"));
        assert_eq!(nyc.region(), Some("Northeast"));
        assert_eq!(nyc.metro_population(), Some(18_823_000));
        assert_eq!(nyc.notes(), None);

        let toronto = Catalog::bundled()
            .continent("North America")
            .unwrap()
            .country("Canada")
            .unwrap()
            .city("Toronto")
            .unwrap()
            .details()
            .unwrap()
            .clone();
        assert_eq!(toronto.province(), Some("Ontario"));
        assert_eq!(toronto.subdivision(), Some("Ontario"));

        // Most cities carry no annotations at all.
        let nairobi = Catalog::bundled()
            .continent("Africa")
            .unwrap()
            .country("Kenya")
            .unwrap()
            .city("Nairobi")
            .unwrap();
        assert!(nairobi.details().is_none());
    }

    #[test]
    fn garbage_json_is_a_parse_error() {
        let err = Catalog::from_json("{ not json").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn metadata_fields_are_optional() {
        let catalog = Catalog::from_json(
            r#"{
                "version": "0.0.0",
                "last_updated": "2024-01-01",
                "continents": [{
                    "name": "Testland",
                    "countries": [{
                        "name": "Test",
                        "cities": [
                            { "name": "Testville", "timezone": "Etc/UTC" }
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let country = catalog
            .continent("Testland")
            .unwrap()
            .country("Test")
            .unwrap();
        assert!(country.population_order().is_empty());
        assert_eq!(country.metadata().largest_city(), None);
        assert_eq!(country.population_rank("Testville"), None);
    }
}
