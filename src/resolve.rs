use serde::{Deserialize, Serialize};

use jiff::tz::TimeZone;

use crate::{
    catalog::{Catalog, City, CityDetails, Country},
    error::Error,
};

/// A user's pick of continent, country and city.
///
/// All three fields are required and are expected to be valid keys in the
/// catalog at the moment of resolution. A selection is a value: a new pick
/// supersedes the old one rather than mutating it.
///
/// The serde representation is the shape persisted by callers (the original
/// widget stores it in a cookie for a year). Deserializing a stale or
/// garbled payload fails; callers treat that as "no saved selection" and
/// fall back to [`Selection::default`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub continent: String,
    pub country: String,
    pub city: String,
}

impl Selection {
    pub fn new(
        continent: impl Into<String>,
        country: impl Into<String>,
        city: impl Into<String>,
    ) -> Selection {
        Selection {
            continent: continent.into(),
            country: country.into(),
            city: city.into(),
        }
    }
}

impl Default for Selection {
    /// The hardcoded fallback selection: New York.
    fn default() -> Selection {
        Selection::new("North America", "United States", "New York")
    }
}

/// What a selection resolves to: the time zone to drive the remote clock,
/// plus the annotations the widget shows next to it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resolved {
    timezone: String,
    population_rank: Option<u32>,
    notes: Vec<String>,
    details: Option<CityDetails>,
}

impl Resolved {
    /// The IANA time zone identifier for the selected city.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// The city's 1-based position in its country's population ordering.
    ///
    /// `None` means unranked. Callers must not display a rank in that case.
    pub fn population_rank(&self) -> Option<u32> {
        self.population_rank
    }

    /// Display annotations, in order: the country's time zone notes, its
    /// special status, any separately indexed anomaly text, then the city's
    /// own zone note. Overlapping text is not de-duplicated.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// The notes joined with `" | "`, the separator the widget renders.
    pub fn display_notes(&self) -> String {
        self.notes.join(" | ")
    }

    /// Administrative annotations for the city, when the catalog carries
    /// them.
    pub fn details(&self) -> Option<&CityDetails> {
        self.details.as_ref()
    }
}

/// A (continent, country, city) triple found by reverse lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Place {
    continent: String,
    country: String,
    city: String,
}

impl Place {
    pub fn continent(&self) -> &str {
        &self.continent
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Converts this place back into a selection, suitable for resolving.
    pub fn to_selection(&self) -> Selection {
        Selection::new(&*self.continent, &*self.country, &*self.city)
    }
}

impl core::fmt::Display for Place {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// Resolves a selection against the catalog.
///
/// Returns the city's time zone identifier, its optional population rank and
/// the annotation text for the country. Fails with a not-found error naming
/// the level (continent, country or city) at which the lookup missed. When
/// selections come from catalog-derived options this never fails; the error
/// path exists so a stale persisted selection cannot take down the caller.
///
/// # Example
///
/// ```
/// use world_clock::{resolve, Catalog, Selection};
///
/// let resolved = resolve(Catalog::bundled(), &Selection::default())?;
/// assert_eq!(resolved.timezone(), "America/New_York");
/// assert_eq!(resolved.population_rank(), Some(1));
/// # Ok::<(), world_clock::Error>(())
/// ```
pub fn resolve(
    catalog: &Catalog,
    selection: &Selection,
) -> Result<Resolved, Error> {
    let continent =
        catalog.continent(&selection.continent).ok_or_else(|| {
            warn!("selection names unknown continent {:?}", selection.continent);
            Error::not_found("continent", &selection.continent)
        })?;
    let country = continent.country(&selection.country).ok_or_else(|| {
        warn!("selection names unknown country {:?}", selection.country);
        Error::not_found("country", &selection.country)
    })?;
    let city = country.city(&selection.city).ok_or_else(|| {
        warn!("selection names unknown city {:?}", selection.city);
        Error::not_found("city", &selection.city)
    })?;
    Ok(Resolved {
        timezone: city.timezone().to_string(),
        population_rank: country.population_rank(city.name()),
        notes: notes_for(catalog, country, city),
        details: city.details().cloned(),
    })
}

/// Collects display notes for a resolved city. Catalog-level notes come
/// before the anomaly annotation, and the city's own note comes last.
fn notes_for(
    catalog: &Catalog,
    country: &Country,
    city: &City,
) -> Vec<String> {
    let mut notes = Vec::new();
    if let Some(text) = country.metadata().timezone_notes() {
        notes.push(text.to_string());
    }
    if let Some(text) = country.metadata().special_status() {
        notes.push(text.to_string());
    }
    if let Some(text) = catalog.anomaly_for(country.name()) {
        notes.push(text.to_string());
    }
    if let Some(text) = city.details().and_then(|d| d.notes()) {
        notes.push(text.to_string());
    }
    notes
}

/// Finds the first catalog city using the given time zone identifier.
///
/// This is a full scan in catalog order, used once at start-up to label the
/// viewer's own clock. Many cities share a zone (routinely a whole country),
/// and no disambiguation is attempted: the first match in catalog order
/// wins. That is a documented limitation of the widget, not a defect.
///
/// Returns `None` when no city uses the identifier; callers fall back to
/// displaying the raw identifier string.
pub fn reverse_lookup(catalog: &Catalog, timezone: &str) -> Option<Place> {
    for continent in catalog.continents() {
        for country in continent.countries() {
            for city in country.cities() {
                if city.timezone() == timezone {
                    return Some(Place {
                        continent: continent.name().to_string(),
                        country: country.name().to_string(),
                        city: city.name().to_string(),
                    });
                }
            }
        }
    }
    None
}

/// Produces the label for the viewer's own clock.
///
/// When the zone maps to a catalog city this is `"City, Country"`; when it
/// carries an IANA name the catalog doesn't know, the raw identifier; and
/// for zones with no name at all (fixed offsets), just `"Local time"`.
pub fn local_label(catalog: &Catalog, tz: &TimeZone) -> String {
    match tz.iana_name() {
        Some(name) => match reverse_lookup(catalog, name) {
            Some(place) => place.to_string(),
            None => name.to_string(),
        },
        None => "Local time".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_scenario() {
        let resolved =
            resolve(Catalog::bundled(), &Selection::default()).unwrap();
        assert_eq!(resolved.timezone(), "America/New_York");
        assert_eq!(resolved.population_rank(), Some(1));
    }

    #[test]
    fn every_catalog_triple_resolves() {
        let catalog = Catalog::bundled();
        for continent in catalog.continents() {
            for country in continent.countries() {
                for city in country.cities() {
                    let sel = Selection::new(
                        continent.name(),
                        country.name(),
                        city.name(),
                    );
                    let resolved = resolve(catalog, &sel).unwrap();
                    assert!(!resolved.timezone().is_empty());
                    if let Some(rank) = resolved.population_rank() {
                        assert!(rank >= 1);
                        assert!(
                            rank as usize <= country.population_order().len()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn misses_name_the_level() {
        let catalog = Catalog::bundled();

        let sel = Selection::new("Middle Earth", "Gondor", "Minas Tirith");
        let err = resolve(catalog, &sel).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("continent"));

        let sel = Selection::new("Europe", "Gondor", "Minas Tirith");
        let err = resolve(catalog, &sel).unwrap_err();
        assert!(err.to_string().contains("country"));

        let sel = Selection::new("Europe", "France", "Minas Tirith");
        let err = resolve(catalog, &sel).unwrap_err();
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn unranked_city_has_no_rank() {
        // Nakuru is a catalog city but absent from Kenya's ranking.
        let sel = Selection::new("Africa", "Kenya", "Nakuru");
        let resolved = resolve(Catalog::bundled(), &sel).unwrap();
        assert_eq!(resolved.population_rank(), None);
    }

    #[test]
    fn notes_put_catalog_text_before_anomaly() {
        let sel = Selection::new("Asia", "China", "Beijing");
        let resolved = resolve(Catalog::bundled(), &sel).unwrap();
        assert_eq!(
            resolved.notes(),
            &[
                "Single timezone (Beijing Time) for entire country",
                "Uses single timezone despite spanning 5 geographical zones",
                "Single timezone despite spanning 5 geographical zones",
            ],
        );
        // The overlap between special status and anomaly text is kept as-is.
        assert_eq!(
            resolved.display_notes(),
            "Single timezone (Beijing Time) for entire country | \
             Uses single timezone despite spanning 5 geographical zones | \
             Single timezone despite spanning 5 geographical zones",
        );
    }

    #[test]
    fn city_note_comes_after_country_notes() {
        let sel = Selection::new("Asia", "China", "Shanghai");
        let resolved = resolve(Catalog::bundled(), &sel).unwrap();
        assert_eq!(
            resolved.notes(),
            &[
                "Single timezone (Beijing Time) for entire country",
                "Uses single timezone despite spanning 5 geographical zones",
                "Single timezone despite spanning 5 geographical zones",
                "Uses unified time despite geographical location",
            ],
        );

        let details = resolved.details().unwrap();
        assert_eq!(details.province(), Some("Municipality"));
        assert_eq!(details.region(), Some("Eastern China"));
        assert_eq!(details.metro_population(), Some(27_796_000));
    }

    #[test]
    fn resolves_across_the_full_dataset() {
        let sel = Selection::new("Africa", "Tanzania", "Dar es Salaam");
        let resolved = resolve(Catalog::bundled(), &sel).unwrap();
        assert_eq!(resolved.timezone(), "Africa/Dar_es_Salaam");
        assert_eq!(resolved.population_rank(), Some(1));
        assert!(resolved.details().is_none());
    }

    #[test]
    fn reverse_lookup_round_trips() {
        let catalog = Catalog::bundled();
        for continent in catalog.continents() {
            for country in continent.countries() {
                for city in country.cities() {
                    let place =
                        reverse_lookup(catalog, city.timezone()).unwrap();
                    let resolved =
                        resolve(catalog, &place.to_selection()).unwrap();
                    assert_eq!(resolved.timezone(), city.timezone());
                }
            }
        }
    }

    #[test]
    fn reverse_lookup_is_first_match() {
        // Europe/Moscow is shared by several Russian cities; the first one
        // in catalog order is Moscow itself.
        let place =
            reverse_lookup(Catalog::bundled(), "Europe/Moscow").unwrap();
        assert_eq!(place.city(), "Moscow");
        assert_eq!(place.country(), "Russia");
        assert_eq!(place.continent(), "Asia");
    }

    #[test]
    fn reverse_lookup_miss() {
        assert_eq!(reverse_lookup(Catalog::bundled(), "Mars/Olympus"), None);
    }

    #[test]
    fn local_label_forms() {
        let catalog = Catalog::bundled();

        let tz = TimeZone::get("Asia/Tokyo").unwrap();
        assert_eq!(local_label(catalog, &tz), "Tokyo, Japan");

        // A real zone the catalog has no city for.
        let tz = TimeZone::get("Pacific/Chatham").unwrap();
        assert_eq!(local_label(catalog, &tz), "Pacific/Chatham");

        // A fixed offset has no IANA name at all.
        let tz = TimeZone::fixed(jiff::tz::offset(-7));
        assert_eq!(local_label(catalog, &tz), "Local time");
    }

    #[test]
    fn selection_round_trips_through_serde() {
        let sel = Selection::new("Europe", "France", "Paris");
        let payload = serde_json::to_string(&sel).unwrap();
        let restored: Selection = serde_json::from_str(&payload).unwrap();
        assert_eq!(restored, sel);

        let catalog = Catalog::bundled();
        let before = resolve(catalog, &sel).unwrap();
        let after = resolve(catalog, &restored).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn persisted_payload_shape_is_stable() {
        let payload =
            r#"{"continent":"Asia","country":"Japan","city":"Tokyo"}"#;
        let sel: Selection = serde_json::from_str(payload).unwrap();
        let resolved = resolve(Catalog::bundled(), &sel).unwrap();
        assert_eq!(resolved.timezone(), "Asia/Tokyo");
    }
}
