//! Property-based invariant tests
//!
//! Determinism, idempotence and retraction round-trips over generated axiom
//! sets. Axioms are synthesised from small id spaces so the generated
//! ontologies actually overlap and fire rules.

use owlet::{Axiom, Concept, Reasoner, Triple};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn class_iri(idx: u8) -> String {
    format!("http://example.org/Class{}", idx % 8)
}

fn individual_iri(idx: u8) -> String {
    format!("http://example.org/ind{}", idx % 12)
}

/// A generated axiom: subclass edge or class membership
#[derive(Clone, Debug)]
enum GenAxiom {
    SubClass(u8, u8),
    Member(u8, u8),
}

fn gen_axiom() -> impl Strategy<Value = GenAxiom> {
    prop_oneof![
        (any::<u8>(), any::<u8>()).prop_map(|(a, b)| GenAxiom::SubClass(a, b)),
        (any::<u8>(), any::<u8>()).prop_map(|(i, c)| GenAxiom::Member(i, c)),
    ]
}

fn realise(reasoner: &mut Reasoner, axiom: &GenAxiom, source: Option<&str>) {
    let built = match axiom {
        GenAxiom::SubClass(a, b) => {
            let sub = reasoner.intern(&class_iri(*a));
            let sup = reasoner.intern(&class_iri(*b));
            Axiom::SubClassOf {
                sub: Concept::Atomic(sub),
                sup: Concept::Atomic(sup),
            }
        }
        GenAxiom::Member(i, c) => {
            let individual = reasoner.intern(&individual_iri(*i));
            let class = reasoner.intern(&class_iri(*c));
            Axiom::ClassAssertion {
                individual,
                concept: Concept::Atomic(class),
            }
        }
    };
    reasoner.load_axioms([built], source);
}

/// Materialised triples rendered to text, so reasoners with different intern
/// orders still compare equal
fn materialisation(reasoner: &Reasoner) -> BTreeSet<(String, String, String)> {
    reasoner
        .facts()
        .iter_alive()
        .map(|(_, t)| {
            (
                reasoner.display(t.subject),
                reasoner.display(t.predicate),
                reasoner.display(t.object),
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The final triple set is independent of assertion batching.
    #[test]
    fn determinism_under_batching(axioms in vec(gen_axiom(), 1..24), split in 0usize..24) {
        let mut one_shot = Reasoner::new();
        for axiom in &axioms {
            realise(&mut one_shot, axiom, None);
        }
        one_shot.reason();

        let mut batched = Reasoner::new();
        let cut = split.min(axioms.len());
        for axiom in &axioms[..cut] {
            realise(&mut batched, axiom, None);
        }
        batched.reason();
        for axiom in &axioms[cut..] {
            realise(&mut batched, axiom, None);
            batched.reason();
        }

        prop_assert_eq!(materialisation(&one_shot), materialisation(&batched));
    }

    /// Asserting an axiom twice is equivalent to asserting it once.
    #[test]
    fn idempotent_assertion(axioms in vec(gen_axiom(), 1..16)) {
        let mut once = Reasoner::new();
        let mut twice = Reasoner::new();
        for axiom in &axioms {
            realise(&mut once, axiom, None);
            realise(&mut twice, axiom, None);
            realise(&mut twice, axiom, None);
        }
        once.reason();
        twice.reason();
        prop_assert_eq!(materialisation(&once), materialisation(&twice));
    }

    /// Loading tagged members and retracting the tag restores the prior
    /// materialisation.
    #[test]
    fn retraction_round_trip(
        schema in vec(gen_axiom(), 1..12),
        extra_members in vec((any::<u8>(), any::<u8>()), 1..8),
    ) {
        let mut reasoner = Reasoner::new();
        for axiom in &schema {
            realise(&mut reasoner, axiom, None);
        }
        reasoner.reason();
        let before = materialisation(&reasoner);

        // Members the schema never mentions, so nothing else justifies them
        for (i, c) in &extra_members {
            let individual = reasoner.intern(&format!("http://example.org/extra{}", i));
            let class = reasoner.intern(&class_iri(*c));
            reasoner.load_axioms(
                [Axiom::ClassAssertion {
                    individual,
                    concept: Concept::Atomic(class),
                }],
                Some("extra"),
            );
        }
        reasoner.reason();
        reasoner.retract_source("extra");

        prop_assert_eq!(before, materialisation(&reasoner));
    }

    /// A derived triple with several justifications survives losing all but
    /// one of them.
    #[test]
    fn counting_invalidation(paths in 2u8..5) {
        let mut reasoner = Reasoner::new();
        let target = reasoner.intern("http://example.org/target");
        let a = reasoner.intern("http://example.org/a");
        let b = reasoner.intern("http://example.org/b");

        for p in 0..paths {
            let role = reasoner.intern(&format!("http://example.org/p{}", p));
            let tag = format!("src{}", p);
            reasoner.load_axioms([Axiom::SubRole { sub: role, sup: target }], None);
            reasoner.load_axioms(
                [Axiom::RoleAssertion { subject: a, role, object: b }],
                Some(tag.as_str()),
            );
        }
        reasoner.reason();
        let derived = Triple::new(a, target, b);
        prop_assert!(reasoner.contains(&derived));

        // Remove all justifications but the last
        for p in 0..paths - 1 {
            reasoner.retract_source(&format!("src{}", p));
            prop_assert!(reasoner.contains(&derived));
        }
        reasoner.retract_source(&format!("src{}", paths - 1));
        prop_assert!(!reasoner.contains(&derived));
    }
}
