pub mod client;
pub mod records;
pub mod view;

use serde::{Deserialize, Serialize};

pub use client::{fetch_live_payload, FetchError, LivePayload};
pub use records::{group_records, RecordError, UNCATEGORIZED};
pub use view::{DirectoryState, DirectoryView, LoadOutcome, SkipReason, ViewStatus};

/// A named group of companies. `name` is the grouping key within a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
    pub companies: Vec<String>,
}

impl Category {
    pub fn new(name: &str, description: &str, companies: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            companies: companies.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Ordered categories, in presentation order.
pub type Snapshot = Vec<Category>;

pub fn placeholder_categories() -> Snapshot {
    vec![
        Category::new(
            "Suppliers",
            "Trusted vendors providing quality components, materials and raw goods.",
            &[
                "Example Supplier Co",
                "American Parts Inc.",
                "Patriot Supplies",
                "Liberty Components",
                "Foundry Works",
            ],
        ),
        Category::new(
            "Manufacturers",
            "Companies that make finished goods right here in the USA.",
            &[
                "Heritage Manufacturing",
                "Star\u{2011}Spangled Fabricators",
                "U.S. Ironworks",
                "Redwood Furnishings",
                "Eagle Electronics",
            ],
        ),
        Category::new(
            "Contracting Organizations",
            "Partners who contract, build and manage large projects.",
            &[
                "Federal Contracts Corp",
                "Local Build Partners",
                "Blue River Construction",
                "North Star Contractors",
                "Rapid Response Logistics",
            ],
        ),
        Category::new(
            "American\u{2011}Made Brands",
            "Consumer brands proudly designing and producing goods in the U.S.",
            &[
                "Made in USA Apparel",
                "Freedom Furniture",
                "Rustic Home Goods",
                "Classic Crafts",
                "Pioneer Outdoors",
            ],
        ),
        Category::new(
            "Retailers",
            "Stores and shops that stock American\u{2011}made products.",
            &[
                "American Goods Outlet",
                "Stars & Stripes Supply",
                "Main Street Market",
                "Liberty Retail Group",
                "Heartland Store",
            ],
        ),
    ]
}
