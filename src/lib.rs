/*!
The lookup-and-tick core of a world clock widget.

This crate owns the three pieces of a "pick a city, watch two clocks"
display that are actually logic, and nothing else:

* A [`Catalog`]: an immutable continent → country → city hierarchy where
every city is keyed to an IANA time zone identifier, with per-country
population ordering and free-text annotations. The data is a versioned asset
bundled with the crate and parsed once.
* A resolver: [`resolve`] turns a [`Selection`] into the zone identifier and
display metadata for a city, and [`reverse_lookup`] maps a zone identifier
back to the first catalog city using it (which labels the viewer's own
clock at start-up).
* A [`Synchronizer`]: once per second it samples a single instant and
renders it twice, in the viewer's zone and in the selected city's zone,
along with a `+1`/`−1` marker when the two clocks sit on different calendar
days.

Everything presentational stays outside: dropdowns, persistence transport,
flags and styling belong to the embedding UI, which feeds selections in and
renders [`Render`] payloads out.

Time zone resolution, civil-time accessors and formatting are all borrowed
from [`jiff`]; this crate deliberately carries no DST rules or offset
arithmetic of its own.

# Example

```
use jiff::Timestamp;
use world_clock::{resolve, Catalog, Selection, Synchronizer};

let catalog = Catalog::bundled();
let selection = Selection::new("Asia", "Japan", "Tokyo");
let resolved = resolve(catalog, &selection)?;
assert_eq!(resolved.timezone(), "Asia/Tokyo");

let mut sync = Synchronizer::new();
sync.activate(resolved.timezone());
let render = sync.tick(Timestamp::now())?;
println!(
    "local {} / Tokyo {} {}",
    render.local(),
    render.remote(),
    render.day_marker().map(|m| m.to_string()).unwrap_or_default(),
);
# Ok::<(), world_clock::Error>(())
```
*/

#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use crate::{
    catalog::{Catalog, City, CityDetails, Continent, Country, CountryMetadata},
    clock::{
        ClockFace, ClockState, DayMarker, Meridiem, Render, Synchronizer,
    },
    error::Error,
    resolve::{
        local_label, resolve, reverse_lookup, Place, Resolved, Selection,
    },
};

#[macro_use]
mod logging;

mod catalog;
mod clock;
mod error;
mod resolve;
