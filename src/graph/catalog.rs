//! Built-in concept catalog for the arithmetic and statistics areas.

use super::{ConceptDomain, ConceptGraph, ConceptNode};

pub fn arithmetic() -> ConceptGraph {
    use ConceptDomain::Arithmetic;

    ConceptGraph::from_nodes([
        ConceptNode::new("fractions", Arithmetic, 2)
            .with_related(&["percentages", "ratios"])
            .with_tags(&["basic", "rational_numbers"]),
        ConceptNode::new("percentages", Arithmetic, 2)
            .with_prerequisites(&["fractions"])
            .with_related(&["ratios", "proportions"])
            .with_tags(&["basic", "applications"]),
        ConceptNode::new("lcm", Arithmetic, 3)
            .with_prerequisites(&["multiples", "prime_factorization"])
            .with_related(&["gcd", "fractions"])
            .with_tags(&["number_theory", "intermediate"]),
        ConceptNode::new("multiples", Arithmetic, 1)
            .with_related(&["division", "multiplication"])
            .with_tags(&["basic", "foundations"]),
        ConceptNode::new("prime_factorization", Arithmetic, 2)
            .with_prerequisites(&["multiples"])
            .with_related(&["prime_numbers", "lcm", "gcd"])
            .with_tags(&["number_theory", "intermediate"]),
        ConceptNode::new("ratios", Arithmetic, 2)
            .with_prerequisites(&["fractions"])
            .with_related(&["percentages", "proportions"])
            .with_tags(&["basic", "applications"]),
        ConceptNode::new("proportions", Arithmetic, 3)
            .with_prerequisites(&["ratios"])
            .with_related(&["percentages", "scaling"])
            .with_tags(&["intermediate", "applications"]),
    ])
}

pub fn statistics() -> ConceptGraph {
    use ConceptDomain::Statistics;

    ConceptGraph::from_nodes([
        ConceptNode::new("frequency_absolute", Statistics, 2)
            .with_prerequisites(&["counting", "categorization"])
            .with_related(&["frequency_relative", "frequency_table"])
            .with_tags(&["descriptive", "basic"]),
        // crosses into arithmetic through percentages
        ConceptNode::new("frequency_relative", Statistics, 3)
            .with_prerequisites(&["frequency_absolute", "percentages"])
            .with_related(&["probability", "proportions"])
            .with_tags(&["descriptive", "intermediate"]),
        ConceptNode::new("frequency_table", Statistics, 2)
            .with_prerequisites(&["frequency_absolute"])
            .with_related(&["data_organization", "categorization"])
            .with_tags(&["descriptive", "tables"]),
        ConceptNode::new("counting", Statistics, 1)
            .with_related(&["frequency_absolute"])
            .with_tags(&["foundations", "basic"]),
        ConceptNode::new("categorization", Statistics, 1)
            .with_related(&["variable_types", "frequency_absolute"])
            .with_tags(&["foundations", "classification"]),
        ConceptNode::new("variable_types", Statistics, 2)
            .with_prerequisites(&["categorization"])
            .with_related(&["qualitative", "quantitative"])
            .with_tags(&["classification", "metadata"]),
        ConceptNode::new("data_organization", Statistics, 2)
            .with_related(&["frequency_table", "charts"])
            .with_tags(&["visualization", "organization"]),
        ConceptNode::new("mean", Statistics, 2)
            .with_prerequisites(&["counting", "sum"])
            .with_related(&["median", "mode", "central_tendency"])
            .with_tags(&["descriptive", "measures"]),
        ConceptNode::new("median", Statistics, 3)
            .with_prerequisites(&["ordering", "counting"])
            .with_related(&["mean", "quartiles"])
            .with_tags(&["descriptive", "measures"]),
        ConceptNode::new("mode", Statistics, 2)
            .with_prerequisites(&["frequency_absolute"])
            .with_related(&["mean", "median"])
            .with_tags(&["descriptive", "measures"]),
    ])
}

/// Every built-in concept in one graph.
pub fn unified() -> ConceptGraph {
    arithmetic().merge(statistics())
}
