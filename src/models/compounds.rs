use serde::Serialize;
use std::collections::HashSet;

/// Cross-reference between one emissions-inventory compound key and the AQS
/// variables that measure it.
#[derive(Debug, Clone, Serialize)]
pub struct CompoundMapping {
    pub emission_key: &'static str,
    pub description: &'static str,
    pub aqs_names: &'static [&'static str],
    pub include: bool,
    pub notes: &'static str,
}

/// CEDS speciated-VOC keys against PAMS VOC parameter names.
pub const COMPOUND_MAPPINGS: &[CompoundMapping] = &[
    CompoundMapping {
        emission_key: "VOC01",
        description: "alcohols",
        aqs_names: &[],
        include: false,
        notes: "Not part of the PAMS target list",
    },
    CompoundMapping {
        emission_key: "VOC02",
        description: "ethane",
        aqs_names: &["Ethane"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC03",
        description: "propane",
        aqs_names: &["Propane"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC04",
        description: "butanes",
        aqs_names: &["n-Butane", "Isobutane"],
        include: true,
        notes: "Inventory lumps both isomers",
    },
    CompoundMapping {
        emission_key: "VOC05",
        description: "pentanes",
        aqs_names: &["n-Pentane", "Isopentane"],
        include: true,
        notes: "Inventory lumps both isomers",
    },
    CompoundMapping {
        emission_key: "VOC06",
        description: "hexanes and higher alkanes",
        aqs_names: &[
            "n-Hexane",
            "2-Methylpentane",
            "3-Methylpentane",
            "n-Heptane",
            "n-Octane",
            "n-Nonane",
            "n-Decane",
        ],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC07",
        description: "ethene",
        aqs_names: &["Ethylene"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC08",
        description: "propene",
        aqs_names: &["Propylene"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC09",
        description: "ethyne",
        aqs_names: &["Acetylene"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC12",
        description: "other alkenes and alkynes",
        aqs_names: &["1-Butene", "cis-2-Butene", "trans-2-Butene", "1-Pentene"],
        include: true,
        notes: "Isoprene left out: mostly biogenic",
    },
    CompoundMapping {
        emission_key: "VOC13",
        description: "benzene",
        aqs_names: &["Benzene"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC14",
        description: "toluene",
        aqs_names: &["Toluene"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC15",
        description: "xylene",
        aqs_names: &["o-Xylene"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC15",
        description: "xylene",
        aqs_names: &["m/p Xylene"],
        include: false,
        notes: "Series index is scrambled in the source data",
    },
    CompoundMapping {
        emission_key: "VOC16",
        description: "trimethylbenzenes",
        aqs_names: &[
            "1,2,3-Trimethylbenzene",
            "1,2,4-Trimethylbenzene",
            "1,3,5-Trimethylbenzene",
        ],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC17",
        description: "other aromatics",
        aqs_names: &["Ethylbenzene", "Styrene", "Isopropylbenzene", "n-Propylbenzene"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC18",
        description: "esters",
        aqs_names: &[],
        include: false,
        notes: "Not part of the PAMS target list",
    },
    CompoundMapping {
        emission_key: "VOC19",
        description: "ethers",
        aqs_names: &[],
        include: false,
        notes: "Not part of the PAMS target list",
    },
    CompoundMapping {
        emission_key: "VOC20",
        description: "chlorinated hydrocarbons",
        aqs_names: &[],
        include: false,
        notes: "Measured under the air toxics class, not PAMS",
    },
    CompoundMapping {
        emission_key: "VOC21",
        description: "methanal",
        aqs_names: &["Formaldehyde"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC22",
        description: "other alkanals",
        aqs_names: &["Acetaldehyde"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC23",
        description: "ketones",
        aqs_names: &["Acetone"],
        include: true,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC24",
        description: "acids",
        aqs_names: &[],
        include: false,
        notes: "",
    },
    CompoundMapping {
        emission_key: "VOC25",
        description: "other VOC",
        aqs_names: &[],
        include: false,
        notes: "Residual category with no measured counterpart",
    },
];

/// The compounds we can both measure and model.
///
/// Returns `(aqs_names, emission_keys)` for the included mappings whose AQS
/// names intersect `measurable`, in table order and without repeats.
pub fn final_compounds(mappings: &[CompoundMapping], measurable: &[String]) -> (Vec<String>, Vec<String>) {
    let measurable: HashSet<&str> = measurable.iter().map(String::as_str).collect();

    let mut aqs_names = Vec::new();
    let mut emission_keys = Vec::new();

    for mapping in mappings.iter().filter(|m| m.include) {
        let matched: Vec<&str> = mapping
            .aqs_names
            .iter()
            .copied()
            .filter(|name| measurable.contains(name))
            .collect();

        if matched.is_empty() {
            continue;
        }

        for name in matched {
            if !aqs_names.iter().any(|n| n == name) {
                aqs_names.push(name.to_string());
            }
        }
        if !emission_keys.iter().any(|k| k == mapping.emission_key) {
            emission_keys.push(mapping.emission_key.to_string());
        }
    }

    (aqs_names, emission_keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_intersection_in_table_order() {
        let measurable = names(&["Toluene", "Benzene", "Ethane", "Chloroform"]);
        let (vocs, keys) = final_compounds(COMPOUND_MAPPINGS, &measurable);

        assert_eq!(vocs, names(&["Ethane", "Benzene", "Toluene"]));
        assert_eq!(keys, names(&["VOC02", "VOC13", "VOC14"]));
    }

    #[test]
    fn test_excluded_mapping_is_skipped() {
        let measurable = names(&["m/p Xylene", "o-Xylene"]);
        let (vocs, keys) = final_compounds(COMPOUND_MAPPINGS, &measurable);

        assert_eq!(vocs, names(&["o-Xylene"]));
        assert_eq!(keys, names(&["VOC15"]));
    }

    #[test]
    fn test_lumped_compound_key_listed_once() {
        let measurable = names(&["n-Butane", "Isobutane"]);
        let (vocs, keys) = final_compounds(COMPOUND_MAPPINGS, &measurable);

        assert_eq!(vocs, names(&["n-Butane", "Isobutane"]));
        assert_eq!(keys, names(&["VOC04"]));
    }

    #[test]
    fn test_nothing_measurable() {
        let (vocs, keys) = final_compounds(COMPOUND_MAPPINGS, &[]);
        assert!(vocs.is_empty());
        assert!(keys.is_empty());
    }
}
