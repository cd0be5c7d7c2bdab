use super::models::BrewingMethod;

/// First method, in catalog order, tagged with `flavor`.
pub fn suggest<'a>(flavor: &str, catalog: &'a [BrewingMethod]) -> Option<&'a BrewingMethod> {
    catalog.iter().find(|method| method.has_flavor(flavor))
}

/// Every flavor tag in the catalog, deduplicated, in first-seen order.
pub fn available_flavors(catalog: &[BrewingMethod]) -> Vec<&str> {
    let mut flavors: Vec<&str> = Vec::new();
    for tag in catalog.iter().flat_map(|method| method.flavor_profiles.iter()) {
        if !flavors.contains(&tag.as_str()) {
            flavors.push(tag);
        }
    }
    flavors
}

pub fn find_method<'a>(id: &str, catalog: &'a [BrewingMethod]) -> Option<&'a BrewingMethod> {
    catalog.iter().find(|method| method.id == id)
}
