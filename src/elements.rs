//! Element symbols and integer masses used by the sweep runs.

/// (symbol, mass) pairs, in sweep order.
pub const ELEMENTS: [(&str, f64); 30] = [
    ("S", 32.0),
    ("Ti", 48.0),
    ("V", 51.0),
    ("Cr", 52.0),
    ("Mn", 55.0),
    ("Fe", 56.0),
    ("Co", 59.0),
    ("Ni", 59.0),
    ("Cu", 63.0),
    ("Zn", 65.0),
    ("Y", 89.0),
    ("Zr", 91.0),
    ("Nb", 93.0),
    ("Mo", 96.0),
    ("Tc", 98.0),
    ("Ru", 101.0),
    ("Rh", 103.0),
    ("Pd", 106.0),
    ("Ag", 108.0),
    ("Cd", 112.0),
    ("Lu", 175.0),
    ("Hf", 178.0),
    ("Ta", 181.0),
    ("W", 184.0),
    ("Re", 186.0),
    ("Os", 190.0),
    ("Ir", 192.0),
    ("Pt", 195.0),
    ("Au", 197.0),
    ("Hg", 200.0),
];

/// Mass for `symbol` (case-sensitive).
pub fn element_mass(symbol: &str) -> Option<f64> {
    ELEMENTS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|&(_, m)| m)
}
