//! End-to-end rewrite scenarios and randomized checks across modules.

use endo_dna::escape::{protect, unescape, MAX_PROTECT_LEVEL};
use endo_dna::{
    execute, iterate, nat, EngineConfig, Items, Machine, PatternItem, RewriteError,
    SpliceStrategy, TemplateItem,
};
use endo_rope::{Base, Rope};
use endo_util::Fuzzer;
use proptest::prelude::*;

fn rope(s: &str) -> Rope {
    s.parse().unwrap()
}

/// Literal-run encoding of `bases`: protection at level one.
fn quote(bases: &str) -> String {
    protect(&rope(bases), 1).to_string()
}

fn nat_text(n: usize) -> String {
    nat::encode(n).to_string()
}

/// Builds a program from items, ending pattern and template with `IIC`.
fn program(pattern: &[PatternItem], template: &[TemplateItem]) -> String {
    let mut out = String::new();
    for item in pattern {
        match item {
            PatternItem::Bases(bases) => out.push_str(&quote(&bases.to_string())),
            PatternItem::Skip(n) => {
                out.push_str("IP");
                out.push_str(&nat_text(*n));
            }
            PatternItem::Search(needle) => {
                out.push_str("IFF");
                out.push_str(&quote(&needle.to_string()));
            }
            PatternItem::Open => out.push_str("IIP"),
            PatternItem::Close => out.push_str("IIC"),
        }
    }
    out.push_str("IIC");
    for item in template {
        match item {
            TemplateItem::Bases(bases) => out.push_str(&quote(&bases.to_string())),
            TemplateItem::Len(group) => {
                out.push_str("IIP");
                out.push_str(&nat_text(*group));
            }
            TemplateItem::Ref { group, level } => {
                out.push_str("IF");
                out.push_str(&nat_text(*level));
                out.push_str(&nat_text(*group));
            }
        }
    }
    out.push_str("IIC");
    out
}

/// A random, well-formed pattern and template with matching group counts.
fn random_program(fuzzer: &Fuzzer) -> (Vec<PatternItem>, Vec<TemplateItem>) {
    let mut pattern = Vec::new();
    let mut depth = 0;
    let mut groups = 0;
    for _ in 0..fuzzer.random_int(1, 8) {
        match fuzzer.random_int(0, 5) {
            0 => pattern.push(PatternItem::Bases(rope(&fuzzer.dna(fuzzer.random_int(1, 3))))),
            1 => pattern.push(PatternItem::Skip(fuzzer.random_int(0, 12))),
            2 => pattern.push(PatternItem::Search(rope(&fuzzer.dna(fuzzer.random_int(1, 2))))),
            3 | 4 => {
                pattern.push(PatternItem::Open);
                depth += 1;
            }
            _ if depth > 0 => {
                pattern.push(PatternItem::Close);
                depth -= 1;
                groups += 1;
            }
            _ => {}
        }
    }
    for _ in 0..depth {
        pattern.push(PatternItem::Close);
        groups += 1;
    }
    let mut template = Vec::new();
    for _ in 0..fuzzer.random_int(0, 6) {
        let group = fuzzer.random_int(0, groups);
        match fuzzer.random_int(0, 4) {
            0 => template.push(TemplateItem::Bases(rope(&fuzzer.dna(fuzzer.random_int(1, 4))))),
            1 => template.push(TemplateItem::Len(group)),
            2 => template.push(TemplateItem::Ref { group, level: fuzzer.random_int(1, 3) }),
            _ => template.push(TemplateItem::Ref { group, level: 0 }),
        }
    }
    (pattern, template)
}

#[test]
fn rewrite_scenarios() {
    let cases = [
        ("IIPIPICPIICICIIFICCIFPPIICCFPC", "PICFC"),
        ("IIPIPICPIICICIIFICCIFCCCPPIICCFPC", "PIICCFCFFPC"),
        ("IIPIPIICPIICIICCIICFCFC", "I"),
    ];
    for (input, expected) in cases {
        for strategy in [SpliceStrategy::Collapse, SpliceStrategy::Full] {
            let step = iterate(&rope(input), strategy);
            assert!(step.rna.is_empty());
            assert_eq!(step.dna.unwrap().to_string(), expected, "{input} with {strategy:?}");
        }
    }
}

#[test]
fn generated_program_round_trips_through_parser() {
    let pattern = vec![
        PatternItem::Open,
        PatternItem::Skip(3),
        PatternItem::Close,
        PatternItem::Bases(rope("ICFP")),
        PatternItem::Search(rope("PC")),
    ];
    let template = vec![
        TemplateItem::Bases(rope("PIP")),
        TemplateItem::Ref { group: 0, level: 2 },
        TemplateItem::Len(0),
    ];
    let text = program(&pattern, &template);
    let dna = rope(&text);
    let mut cursor = dna.cursor();
    let mut rna = Vec::new();
    let parsed = endo_dna::parse_pattern(&mut cursor, &mut rna).unwrap();
    assert_eq!(Items(&parsed).to_string(), Items(&pattern).to_string());
    let parsed = endo_dna::parse_template(&mut cursor, &mut rna).unwrap();
    assert_eq!(Items(&parsed).to_string(), Items(&template).to_string());
    assert!(cursor.at_end());
    assert!(rna.is_empty());
}

#[test]
fn rewrite_copies_group_into_place() {
    // ( !4 ) -> $0 $0
    let pattern = [PatternItem::Open, PatternItem::Skip(4), PatternItem::Close];
    let template = [
        TemplateItem::Ref { group: 0, level: 0 },
        TemplateItem::Ref { group: 0, level: 0 },
    ];
    let text = format!("{}ICFPCCCC", program(&pattern, &template));
    let result = iterate(&rope(&text), SpliceStrategy::Collapse);
    assert_eq!(result.dna.unwrap().to_string(), "ICFPICFPCCCC");
}

#[test]
fn iteration_limit_leaves_dna_behind() {
    // `( !0 ) -> CF` prepends CF; the next pass reads CF as the literal
    // pattern `IC`, fails to match and drops one copy of the program.
    let pattern = [PatternItem::Open, PatternItem::Skip(0), PatternItem::Close];
    let template = [TemplateItem::Bases(rope("CF"))];
    let text = program(&pattern, &template);
    let dna = rope(&text.repeat(4));
    let config = EngineConfig {
        max_iterations: Some(3),
        ..EngineConfig::default()
    };
    let mut machine = Machine::new(dna, config);
    let summary = machine.run(|_| {});
    assert_eq!(summary.iterations, 3);
    assert!(!summary.finished);
    assert_eq!(machine.dna().to_string(), format!("CF{text}"));
}

#[test]
fn rna_is_streamed_in_order() {
    let text = "IIIPIIFIIPCIIIIIICIICIIIFFFFFFFIICPP";
    let result = execute(rope(text));
    let rna: Vec<String> = result.rna.iter().map(|r| r.to_string()).collect();
    assert_eq!(rna, ["PIIFIIP", "IIICIIC", "FFFFFFF"]);
    assert_eq!(result.iterations, 0);
}

#[test]
fn programs_run_one_after_another() {
    // each program emits once and deletes itself
    let dna = rope("IIIPIIFIIPIICIICIIIFFFFFFFIICIIC");
    for splice in [SpliceStrategy::Collapse, SpliceStrategy::Full] {
        let config = EngineConfig {
            splice,
            ..EngineConfig::default()
        };
        let mut machine = Machine::new(dna.clone(), config);
        let mut rna = Vec::new();
        let summary = machine.run(|r| rna.push(r.to_string()));
        assert_eq!(rna, ["PIIFIIP", "FFFFFFF"]);
        assert_eq!(summary.iterations, 2);
        assert!(summary.finished);
        assert!(machine.dna().is_empty());
    }
}

#[test]
fn quoting_too_deep_halts_the_program() {
    // ( !1 ) -> $0 quoted at a 64-bit level, then one base to capture
    let text = format!("IIPIPCPIICIICIF{}PPIICC", "C".repeat(64));
    for splice in [SpliceStrategy::Collapse, SpliceStrategy::Full] {
        let step = iterate(&rope(&text), splice);
        assert!(step.matched);
        assert_eq!(step.dna, None);
        assert_eq!(
            step.error,
            Some(RewriteError::ProtectionTooDeep {
                group: 0,
                level: usize::MAX
            })
        );

        let config = EngineConfig {
            splice,
            ..EngineConfig::default()
        };
        let mut machine = Machine::new(rope(&text), config);
        let summary = machine.run(|_| {});
        assert!(summary.finished);
        assert_eq!(summary.iterations, 0);
        assert!(machine.error().is_some());
    }
}

#[test]
fn deepest_allowed_quote_still_runs() {
    let pattern = [PatternItem::Open, PatternItem::Skip(1), PatternItem::Close];
    let template = [TemplateItem::Ref {
        group: 0,
        level: MAX_PROTECT_LEVEL,
    }];
    let text = format!("{}C", program(&pattern, &template));
    let next = iterate(&rope(&text), SpliceStrategy::Full).dna.unwrap();
    assert_eq!(next.to_string(), protect(&rope("C"), MAX_PROTECT_LEVEL).to_string());
}

#[test]
fn coverage_listing_follows_the_source() {
    let text = "IIPIPICPIICICIIFICCIFPPIICCFPC";
    let config = EngineConfig {
        coverage: true,
        ..EngineConfig::default()
    };
    let mut machine = Machine::new(rope(text), config);
    let summary = machine.run(|_| {});
    assert_eq!(summary.iterations, 1);
    let coverage = machine.coverage().unwrap();
    // the second pass reads the kept group as a pattern literal
    let group = coverage.get(27, 0).unwrap();
    assert_eq!(group.first, 2);
    assert!(group.splice);

    let mut out = Vec::new();
    coverage.write_listing(&rope(text), &mut out).unwrap();
    let listing = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines[0], "00000000@0 [1..1 #1] (");
    assert_eq!(lines[1], "00000003@0 [1..1 #1] !2");
    assert!(lines.contains(&"--- 0 ---"));
    assert!(lines.contains(&"--- -1 ---"));
    let source: String = lines
        .iter()
        .filter(|line| !line.contains('@') && !line.starts_with("---"))
        .map(|line| &line[9..])
        .collect();
    assert_eq!(source, text);
}

#[test]
fn collapse_and_full_agree_on_random_programs() {
    let fuzzer = Fuzzer::from_u64(0x0e4d0);
    for round in 0..300 {
        let (pattern, template) = random_program(&fuzzer);
        let tail = fuzzer.dna_weighted(fuzzer.random_int(0, 80), 0.3);
        let text = format!("{}{}", program(&pattern, &template), tail);
        let dna = fuzzer.fragmented(&text, 7);
        let collapsed = iterate(&dna, SpliceStrategy::Collapse);
        let full = iterate(&dna, SpliceStrategy::Full);
        assert_eq!(collapsed.matched, full.matched, "round {round}: {text}");
        assert_eq!(collapsed.dna, full.dna, "round {round}: {text}");
        if let Some(next) = &collapsed.dna {
            assert!(next.is_balanced(), "round {round}");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn nat_round_trip(n in any::<usize>()) {
        let encoded = nat::encode(n);
        let mut cursor = encoded.cursor();
        prop_assert_eq!(nat::decode(&mut cursor), Some(n));
        prop_assert!(cursor.at_end());
    }

    #[test]
    fn protect_then_unescape_is_identity(bases in proptest::collection::vec(0u8..4, 0..200)) {
        let text: String = bases.iter().map(|&b| Base::from_u2(b).to_char()).collect();
        let dna = rope(&text);
        let decoded = unescape(&protect(&dna, 1).to_cells());
        prop_assert_eq!(Rope::from_cells(decoded), dna);
    }

    #[test]
    fn protect_levels_compose(
        bases in proptest::collection::vec(0u8..4, 0..60),
        a in 0usize..4,
        b in 0usize..4,
    ) {
        let text: String = bases.iter().map(|&x| Base::from_u2(x).to_char()).collect();
        let dna = rope(&text);
        let stepwise = protect(&protect(&dna, a), b);
        prop_assert_eq!(stepwise.to_string(), protect(&dna, a + b).to_string());
    }
}
