//! The fixed list of doctor specialties.

/// A doctor specialty as identified by the API's `categoryId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specialty {
    pub id: u32,
    pub name: &'static str,
}

/// Every specialty the API knows about. This is the only definition.
pub const SPECIALTIES: &[Specialty] = &[
    Specialty { id: 7, name: "Cardiology" },
    Specialty { id: 8, name: "Dentist" },
    Specialty { id: 9, name: "Dermatology" },
    Specialty { id: 10, name: "ENT" },
    Specialty { id: 11, name: "Orthopaedic" },
    Specialty { id: 12, name: "Pediatrics" },
];

/// Name shown for a category id the catalog does not contain.
pub const FALLBACK_SPECIALTY: &str = "General";

pub fn find(specialties: &[Specialty], id: u32) -> Option<&Specialty> {
    specialties.iter().find(|s| s.id == id)
}

/// Table label for a category id, upper-cased.
pub fn label(specialties: &[Specialty], id: u32) -> String {
    find(specialties, id)
        .map(|s| s.name)
        .unwrap_or(FALLBACK_SPECIALTY)
        .to_uppercase()
}

/// The specialty `step` positions away from `current`, wrapping around.
/// An unknown `current` starts from the first entry.
pub fn cycle(specialties: &[Specialty], current: u32, step: isize) -> Option<&Specialty> {
    let len = specialties.len();
    if len == 0 {
        return None;
    }
    let position = match specialties.iter().position(|s| s.id == current) {
        Some(position) => {
            let len = len as isize;
            ((position as isize + step) % len + len) % len
        }
        None => 0,
    };
    specialties.get(position as usize)
}
