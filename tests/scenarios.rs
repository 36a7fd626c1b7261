//! End-to-end reasoning scenarios
//!
//! Each test drives the public API the way a host would: intern terms, load
//! axioms, reason to quiescence, query, retract.

use owlet::{
    Axiom, BuiltinOp, CompareOp, Concept, FilterExpr, FilterValue, Order, Query, QueryTerm as Q,
    Reasoner, SwrlArg, SwrlAtom, TriplePattern, Triple,
};
use owlet::vocab::{self, RDF_TYPE, XSD_INTEGER, XSD_STRING};

fn ex(name: &str) -> String {
    format!("http://example.org/{}", name)
}

#[test]
fn subclass_closure_with_thing_membership() {
    // Person ⊑ Animal; Person(john)
    let mut r = Reasoner::new();
    let person = r.intern(&ex("Person"));
    let animal = r.intern(&ex("Animal"));
    let john = r.intern(&ex("john"));
    r.load_axioms(
        [
            Axiom::SubClassOf {
                sub: Concept::Atomic(person),
                sup: Concept::Atomic(animal),
            },
            Axiom::ClassAssertion {
                individual: john,
                concept: Concept::Atomic(person),
            },
        ],
        None,
    );
    r.reason();

    let v = r.vocab();
    assert!(r.contains(&Triple::new(john, v.rdf_type, person)));
    assert!(r.contains(&Triple::new(john, v.rdf_type, animal)));
    assert!(r.contains(&Triple::new(john, v.rdf_type, v.thing)));
    assert!(r.is_consistent());
}

#[test]
fn role_chain_derives_and_retracts_grandparent() {
    // hasParent ∘ hasParent ⊑ hasGrandparent
    let mut r = Reasoner::new();
    let has_parent = r.intern(&ex("hasParent"));
    let has_grandparent = r.intern(&ex("hasGrandparent"));
    let (a, b, c) = (r.intern(&ex("a")), r.intern(&ex("b")), r.intern(&ex("c")));

    r.load_axioms(
        [Axiom::RoleChain {
            chain: vec![has_parent, has_parent],
            sup: has_grandparent,
        }],
        None,
    );
    r.load_axioms(
        [Axiom::RoleAssertion {
            subject: a,
            role: has_parent,
            object: b,
        }],
        Some("gen1"),
    );
    r.load_axioms(
        [Axiom::RoleAssertion {
            subject: b,
            role: has_parent,
            object: c,
        }],
        Some("gen2"),
    );
    r.reason();
    assert!(r.contains(&Triple::new(a, has_grandparent, c)));

    let report = r.retract_source("gen2");
    assert!(report
        .retracted
        .contains(&Triple::new(a, has_grandparent, c)));
    assert!(!r.contains(&Triple::new(a, has_grandparent, c)));
    assert!(r.contains(&Triple::new(a, has_parent, b)));
}

#[test]
fn swrl_age_rule_follows_its_sources() {
    // Person(?x) ∧ age(?x, ?a) ∧ ge(?a, 18) → Adult(?x)
    let mut r = Reasoner::new();
    let person = r.intern(&ex("Person"));
    let adult = r.intern(&ex("Adult"));
    let age = r.intern(&ex("age"));
    let alice = r.intern(&ex("alice"));
    let eighteen = r.intern_literal("18", XSD_INTEGER);
    let seventeen = r.intern_literal("17", XSD_INTEGER);

    r.load_axioms(
        [Axiom::SwrlRule {
            body: vec![
                SwrlAtom::Class {
                    concept: person,
                    arg: SwrlArg::Var("x".to_string()),
                },
                SwrlAtom::Data {
                    role: age,
                    subject: SwrlArg::Var("x".to_string()),
                    value: SwrlArg::Var("a".to_string()),
                },
                SwrlAtom::Builtin {
                    op: BuiltinOp::GreaterThanOrEqual,
                    args: vec![SwrlArg::Var("a".to_string()), SwrlArg::Term(eighteen)],
                },
            ],
            head: vec![SwrlAtom::Class {
                concept: adult,
                arg: SwrlArg::Var("x".to_string()),
            }],
        }],
        None,
    );
    r.load_axioms(
        [Axiom::ClassAssertion {
            individual: alice,
            concept: Concept::Atomic(person),
        }],
        Some("people"),
    );
    r.load_axioms(
        [Axiom::DataAssertion {
            subject: alice,
            role: age,
            value: seventeen,
        }],
        Some("age-17"),
    );
    r.reason();

    let v = r.vocab();
    let adult_fact = Triple::new(alice, v.rdf_type, adult);
    assert!(!r.contains(&adult_fact));

    // The new age arrives, the old one is withdrawn
    r.load_axioms(
        [Axiom::DataAssertion {
            subject: alice,
            role: age,
            value: eighteen,
        }],
        Some("age-18"),
    );
    r.retract_source("age-17");
    r.reason();
    assert!(r.contains(&adult_fact));

    // Retracting the qualifying age withdraws the conclusion
    r.retract_source("age-18");
    assert!(!r.contains(&adult_fact));
}

#[test]
fn functional_role_merges_fillers() {
    // Functional(hasFather); hasFather(a, b); hasFather(a, c) ⇒ sameAs(b, c)
    let mut r = Reasoner::new();
    let has_father = r.intern(&ex("hasFather"));
    let (a, b, c) = (r.intern(&ex("a")), r.intern(&ex("b")), r.intern(&ex("c")));
    r.load_axioms(
        [
            Axiom::FunctionalRole(has_father),
            Axiom::RoleAssertion {
                subject: a,
                role: has_father,
                object: b,
            },
            Axiom::RoleAssertion {
                subject: a,
                role: has_father,
                object: c,
            },
        ],
        None,
    );
    r.reason();

    let v = r.vocab();
    assert!(
        r.contains(&Triple::new(b, v.same_as, c)) || r.contains(&Triple::new(c, v.same_as, b))
    );
    // One representative is elected for the merged class
    assert_eq!(r.canonical(b), r.canonical(c));
}

#[test]
fn two_union_blocks_join_with_outer_patterns() {
    // The call-graph query: both endpoint typings go through their own UNION
    let mut r = Reasoner::new();
    let method = r.intern(&ex("Method"));
    let function = r.intern(&ex("Function"));
    let name = r.intern(&ex("name"));
    let calls = r.intern(&ex("calls"));

    let mut axioms = Vec::new();
    for (id, class, label) in [
        ("m1", method, "method_one"),
        ("m2", method, "method_two"),
        ("f1", function, "func_one"),
        ("f2", function, "func_two"),
    ] {
        let individual = r.intern(&ex(id));
        axioms.push(Axiom::ClassAssertion {
            individual,
            concept: Concept::Atomic(class),
        });
        let label = r.intern_literal(label, XSD_STRING);
        axioms.push(Axiom::DataAssertion {
            subject: individual,
            role: name,
            value: label,
        });
    }
    for (from, to) in [("m1", "f1"), ("f1", "m2"), ("m2", "f2")] {
        let subject = r.intern(&ex(from));
        let object = r.intern(&ex(to));
        axioms.push(Axiom::RoleAssertion {
            subject,
            role: calls,
            object,
        });
    }
    r.load_axioms(axioms, None);
    r.reason();

    let typed = |var: &str, class: &str| {
        vec![TriplePattern::new(
            Q::var(var),
            Q::iri(RDF_TYPE),
            Q::iri(ex(class)),
        )]
    };
    let query = Query::select(["caller", "caller_name", "callee", "callee_name"])
        .union(vec![typed("caller", "Method"), typed("caller", "Function")])
        .pattern(Q::var("caller"), Q::iri(ex("name")), Q::var("caller_name"))
        .pattern(Q::var("caller"), Q::iri(ex("calls")), Q::var("callee"))
        .union(vec![typed("callee", "Method"), typed("callee", "Function")])
        .pattern(Q::var("callee"), Q::iri(ex("name")), Q::var("callee_name"));

    let table = r.select(&query).unwrap();
    assert_eq!(table.len(), 3, "both unions must join, not short-circuit");
}

#[test]
fn subgraph_traversal_stays_within_depth() {
    // Edges A→B, B→C, B→D, E→F, F→G
    let mut r = Reasoner::new();
    let edge = r.intern(&ex("edge"));
    for (from, to) in [("A", "B"), ("B", "C"), ("B", "D"), ("E", "F"), ("F", "G")] {
        let subject = r.intern(&ex(from));
        let object = r.intern(&ex(to));
        r.load_axioms(
            [Axiom::RoleAssertion {
                subject,
                role: edge,
                object,
            }],
            None,
        );
    }
    r.reason();

    let result = r.subgraph(&ex("edge"), &ex("A"), 2);
    let a = r.term(&ex("A")).unwrap();
    let b = r.term(&ex("B")).unwrap();
    let c = r.term(&ex("C")).unwrap();
    let d = r.term(&ex("D")).unwrap();
    let mut got = result.clone();
    got.sort();
    let mut expected = vec![(a, b), (b, c), (b, d)];
    expected.sort();
    assert_eq!(got, expected);

    assert!(r.subgraph(&ex("edge"), &ex("NONEXISTENT"), 2).is_empty());
    assert!(r.subgraph(&ex("edge"), &ex("A"), 0).is_empty());
}

#[test]
fn multiply_derived_fact_survives_partial_retraction() {
    // Two independent sources each justify r(a, b) through their own rule
    let mut r = Reasoner::new();
    let p = r.intern(&ex("p"));
    let q = r.intern(&ex("q"));
    let target = r.intern(&ex("r"));
    let (a, b) = (r.intern(&ex("a")), r.intern(&ex("b")));

    r.load_axioms(
        [
            Axiom::SubRole { sub: p, sup: target },
            Axiom::SubRole { sub: q, sup: target },
        ],
        None,
    );
    r.load_axioms(
        [Axiom::RoleAssertion {
            subject: a,
            role: p,
            object: b,
        }],
        Some("src-p"),
    );
    r.load_axioms(
        [Axiom::RoleAssertion {
            subject: a,
            role: q,
            object: b,
        }],
        Some("src-q"),
    );
    r.reason();
    let derived = Triple::new(a, target, b);
    assert!(r.contains(&derived));

    r.retract_source("src-p");
    assert!(r.contains(&derived), "second justification must keep it");

    r.retract_source("src-q");
    assert!(!r.contains(&derived));
}

#[test]
fn domain_and_range_type_the_endpoints() {
    let mut r = Reasoner::new();
    let employs = r.intern(&ex("employs"));
    let employer = r.intern(&ex("Employer"));
    let employee = r.intern(&ex("Employee"));
    let (acme, joe) = (r.intern(&ex("acme")), r.intern(&ex("joe")));
    r.load_axioms(
        [
            Axiom::RoleDomain {
                role: employs,
                domain: Concept::Atomic(employer),
            },
            Axiom::RoleRange {
                role: employs,
                range: Concept::Atomic(employee),
            },
            Axiom::RoleAssertion {
                subject: acme,
                role: employs,
                object: joe,
            },
        ],
        None,
    );
    r.reason();

    let v = r.vocab();
    assert!(r.contains(&Triple::new(acme, v.rdf_type, employer)));
    assert!(r.contains(&Triple::new(joe, v.rdf_type, employee)));
}

#[test]
fn inverse_and_transitive_roles_compose() {
    let mut r = Reasoner::new();
    let ancestor = r.intern(&ex("ancestorOf"));
    let descendant = r.intern(&ex("descendantOf"));
    let (a, b, c) = (r.intern(&ex("a")), r.intern(&ex("b")), r.intern(&ex("c")));
    r.load_axioms(
        [
            Axiom::TransitiveRole(ancestor),
            Axiom::InverseRoles(ancestor, descendant),
            Axiom::RoleAssertion {
                subject: a,
                role: ancestor,
                object: b,
            },
            Axiom::RoleAssertion {
                subject: b,
                role: ancestor,
                object: c,
            },
        ],
        None,
    );
    r.reason();

    assert!(r.contains(&Triple::new(a, ancestor, c)));
    assert!(r.contains(&Triple::new(c, descendant, a)));
}

#[test]
fn has_key_identifies_individuals() {
    let mut r = Reasoner::new();
    let book = r.intern(&ex("Book"));
    let isbn = r.intern(&ex("isbn"));
    let (x, y) = (r.intern(&ex("thisBook")), r.intern(&ex("thatBook")));
    let code = r.intern_literal("978-3-16-148410-0", XSD_STRING);
    r.load_axioms(
        [
            Axiom::HasKey {
                class: Concept::Atomic(book),
                keys: vec![isbn],
            },
            Axiom::ClassAssertion {
                individual: x,
                concept: Concept::Atomic(book),
            },
            Axiom::ClassAssertion {
                individual: y,
                concept: Concept::Atomic(book),
            },
            Axiom::DataAssertion {
                subject: x,
                role: isbn,
                value: code,
            },
            Axiom::DataAssertion {
                subject: y,
                role: isbn,
                value: code,
            },
        ],
        None,
    );
    r.reason();
    assert_eq!(r.canonical(x), r.canonical(y));
}

#[test]
fn same_as_different_from_collision_is_flagged() {
    let mut r = Reasoner::new();
    let (a, b) = (r.intern(&ex("a")), r.intern(&ex("b")));
    r.load_axioms(
        [
            Axiom::DifferentFrom(vec![a, b]),
            Axiom::SameAs(vec![a, b]),
        ],
        None,
    );
    r.reason();
    assert!(!r.is_consistent());
}

#[test]
fn same_as_rewrites_are_undone_with_their_source() {
    let mut r = Reasoner::new();
    let knows = r.intern(&ex("knows"));
    let (a, b, c) = (r.intern(&ex("a")), r.intern(&ex("b")), r.intern(&ex("c")));
    r.load_axioms(
        [Axiom::RoleAssertion {
            subject: a,
            role: knows,
            object: c,
        }],
        None,
    );
    r.load_axioms([Axiom::SameAs(vec![a, b])], Some("alias"));
    r.reason();
    // b inherits a's edges through the merge
    assert!(r.contains(&Triple::new(b, knows, c)));
    assert_eq!(r.canonical(a), r.canonical(b));

    r.retract_source("alias");
    assert!(!r.contains(&Triple::new(b, knows, c)));
    assert_ne!(r.canonical(a), r.canonical(b));
}

#[test]
fn ask_describe_and_role_assertions() {
    let mut r = Reasoner::new();
    let person = r.intern(&ex("Person"));
    let knows = r.intern(&ex("knows"));
    let (alice, bob) = (r.intern(&ex("alice")), r.intern(&ex("bob")));
    r.load_axioms(
        [
            Axiom::ClassAssertion {
                individual: alice,
                concept: Concept::Atomic(person),
            },
            Axiom::RoleAssertion {
                subject: alice,
                role: knows,
                object: bob,
            },
        ],
        None,
    );
    r.reason();

    let query = Query::select(["x"]).pattern(
        Q::var("x"),
        Q::iri(RDF_TYPE),
        Q::iri(ex("Person")),
    );
    assert!(r.ask(&query).unwrap());

    let described = r.describe(&ex("alice"));
    assert!(described.len() >= 2);

    let roles = r.role_assertions(None, None, None);
    assert_eq!(roles.len(), 1);
    let by_role = r.role_assertions(Some(ex("knows").as_str()), None, None);
    assert_eq!(by_role.len(), 1);
}

#[test]
fn filters_and_modifiers_on_data_properties() {
    let mut r = Reasoner::new();
    let score = r.intern(&ex("score"));
    for (name, value) in [("a", "10"), ("b", "25"), ("c", "40")] {
        let individual = r.intern(&ex(name));
        let literal = r.intern_literal(value, XSD_INTEGER);
        r.load_axioms(
            [Axiom::DataAssertion {
                subject: individual,
                role: score,
                value: literal,
            }],
            None,
        );
    }
    r.reason();

    let query = Query::select(["x", "s"])
        .pattern(Q::var("x"), Q::iri(ex("score")), Q::var("s"))
        .filter(FilterExpr::Compare(
            CompareOp::Gt,
            FilterValue::Var("s".to_string()),
            FilterValue::Literal {
                lexical: "15".to_string(),
                datatype: XSD_INTEGER.to_string(),
            },
        ))
        .order_by("s", Order::Desc);
    let table = r.select(&query).unwrap();
    assert_eq!(table.len(), 2);
    let c = r.term(&ex("c")).unwrap();
    assert_eq!(table.rows[0][0], Some(c));
}

#[test]
fn non_rl_axioms_are_refused_with_events() {
    let mut r = Reasoner::new();
    let a = r.intern(&ex("A"));
    let role = r.intern(&ex("r"));
    let b = r.intern(&ex("B"));
    let summary = r.load_axioms(
        [Axiom::SubClassOf {
            sub: Concept::Atomic(a),
            sup: Concept::some(role, Concept::Atomic(b)),
        }],
        None,
    );
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.productions, 0);
    assert!(r
        .events()
        .iter()
        .any(|e| matches!(e, owlet::ReasonerEvent::NonRlAxiom { .. })));
}

#[test]
fn equivalent_classes_flow_both_ways() {
    let mut r = Reasoner::new();
    let human = r.intern(&ex("Human"));
    let person = r.intern(&ex("Person"));
    let (x, y) = (r.intern(&ex("x")), r.intern(&ex("y")));
    r.load_axioms(
        [
            Axiom::EquivClasses(Concept::Atomic(human), Concept::Atomic(person)),
            Axiom::ClassAssertion {
                individual: x,
                concept: Concept::Atomic(human),
            },
            Axiom::ClassAssertion {
                individual: y,
                concept: Concept::Atomic(person),
            },
        ],
        None,
    );
    r.reason();
    let v = r.vocab();
    assert!(r.contains(&Triple::new(x, v.rdf_type, person)));
    assert!(r.contains(&Triple::new(y, v.rdf_type, human)));
}

#[test]
fn literal_spellings_share_one_value() {
    let mut r = Reasoner::new();
    let score = r.intern(&ex("score"));
    let a = r.intern(&ex("a"));
    let one_decimal = r.intern_literal("1.0", vocab::XSD_DECIMAL);
    let one_long = r.intern_literal("1.00", vocab::XSD_DECIMAL);
    assert_eq!(one_decimal, one_long);

    r.load_axioms(
        [Axiom::DataAssertion {
            subject: a,
            role: score,
            value: one_decimal,
        }],
        None,
    );
    r.reason();
    let query = Query::select(["x"]).pattern(
        Q::var("x"),
        Q::iri(ex("score")),
        Q::literal("1.00", vocab::XSD_DECIMAL),
    );
    assert_eq!(r.select(&query).unwrap().len(), 1);
}
