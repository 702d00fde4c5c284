//! Drives the passes over every unit of a [`Workspace`].
//!
//! Each pass is a barrier: all units finish it before the next starts, so a
//! unit can always rely on what the previous pass recorded for every other
//! unit. Inside a pass, units are spread over scoped worker threads and meet
//! in the shared [`Program`].

use std::thread;

use derive_more::Display;
use indexmap::IndexMap;
use log::{debug, trace};
use oriel_span::{Report, SourceId};
use oriel_symbols::{CompilerError, SemanticError, SymbolTable};
use oriel_tree::prelude::*;

use crate::{
    define::define_unit,
    explicit::{self, Constraint},
    inferred,
    options::ResolveOptions,
    program::Program,
    records::UnitRecords,
    workspace::Workspace,
};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    #[display("definition")]
    Definition,
    #[display("explicit types")]
    ExplicitTypes,
    #[display("inferred types")]
    InferredTypes,
    #[display("done")]
    Done,
}

impl Pass {
    pub fn next(self) -> Self {
        match self {
            Self::Definition => Self::ExplicitTypes,
            Self::ExplicitTypes => Self::InferredTypes,
            Self::InferredTypes | Self::Done => Self::Done,
        }
    }
}

/// Everything known about one unit: its tree, what the passes recorded on
/// its nodes and the diagnostics raised against it.
#[derive(Debug, Clone)]
pub struct UnitResolution {
    pub tree: Tree,
    pub records: UnitRecords,
    pub report: Report,
}

impl UnitResolution {
    fn new(tree: Tree) -> Self {
        Self {
            tree,
            records: UnitRecords::new(),
            report: Report::new(),
        }
    }

    pub fn source(&self) -> SourceId {
        self.tree.source()
    }
}

#[derive(Debug)]
pub struct ResolveOutput {
    pub table: SymbolTable,
    pub units: IndexMap<SourceId, UnitResolution>,
    /// The first pass that did not succeed, or `Done`.
    pub pass: Pass,
}

impl ResolveOutput {
    pub fn unit(&self, source: SourceId) -> Option<&UnitResolution> {
        self.units.get(&source)
    }

    pub fn has_errors(&self) -> bool {
        self.units.values().any(|unit| unit.report.has_errors())
    }

    pub fn is_complete(&self) -> bool {
        self.pass == Pass::Done
    }
}

/// Runs every pass over `workspace`, stopping after the first pass that
/// leaves errors in any report.
pub fn resolve(
    workspace: &Workspace,
    options: ResolveOptions,
) -> Result<ResolveOutput, CompilerError> {
    let mut coordinator = Coordinator::new(workspace, options)?;
    coordinator.run()?;
    Ok(coordinator.finish())
}

#[derive(Debug)]
pub struct Coordinator {
    options: ResolveOptions,
    program: Program,
    units: Vec<UnitResolution>,
    pass: Pass,
    failed: bool,
}

impl Coordinator {
    pub fn new(workspace: &Workspace, options: ResolveOptions) -> Result<Self, CompilerError> {
        options.weights.validate()?;
        let mut table = SymbolTable::with_core()?;
        table.set_weights(options.weights);

        Ok(Self {
            options,
            program: Program::new(table),
            units: workspace
                .units()
                .map(|unit| UnitResolution::new(unit.tree.clone()))
                .collect(),
            pass: Pass::Definition,
            failed: false,
        })
    }

    /// The pass [`run_pass`](Self::run_pass) would run next.
    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn units(&self) -> &[UnitResolution] {
        &self.units
    }

    /// Runs the current pass over every unit and advances if no report has
    /// errors. Returns whether it advanced; once a pass failed nothing runs
    /// any more.
    pub fn run_pass(&mut self) -> Result<bool, CompilerError> {
        let pass = self.pass;
        if self.failed || pass == Pass::Done {
            return Ok(false);
        }

        debug!("{pass} pass over {} units", self.units.len());
        match pass {
            Pass::Definition => self.define()?,
            Pass::ExplicitTypes => self.resolve_explicit()?,
            Pass::InferredTypes => self.infer()?,
            Pass::Done => {}
        }

        let failing = self
            .units
            .iter()
            .filter(|unit| unit.report.has_errors())
            .count();
        if failing > 0 {
            debug!("{pass} pass failed in {failing} units");
            self.failed = true;
            return Ok(false);
        }

        self.pass = pass.next();
        debug!("{pass} pass finished");
        Ok(true)
    }

    /// Runs passes until done or one fails; returns whether all succeeded.
    pub fn run(&mut self) -> Result<bool, CompilerError> {
        while self.pass != Pass::Done {
            if !self.run_pass()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn finish(self) -> ResolveOutput {
        ResolveOutput {
            table: self.program.into_table(),
            units: self
                .units
                .into_iter()
                .map(|unit| (unit.source(), unit))
                .collect(),
            pass: self.pass,
        }
    }

    fn workers(&self) -> usize {
        self.options.workers_for(self.units.len())
    }

    /// Units build their tables apart and are merged one at a time, in unit
    /// order, so clashes are always reported against the later unit.
    fn define(&mut self) -> Result<(), CompilerError> {
        let workers = self.workers();
        let tables = for_each_unit(&mut self.units, workers, |unit| {
            let defined = define_unit(&unit.tree, &mut unit.report)?;
            unit.records = defined.records;
            Ok(defined.table)
        })?;

        let mut program = self.program.write();
        for (unit, table) in self.units.iter_mut().zip(tables) {
            let absorbed = program.absorb(table)?;
            unit.records.rebase(&absorbed.rebase);
            unit.report.extend(absorbed.clashes.into_iter().map(Into::into));
            trace!("merged {:?}", unit.source());
        }
        Ok(())
    }

    fn resolve_explicit(&mut self) -> Result<(), CompilerError> {
        let workers = self.workers();
        let program = &self.program;

        let constraints: Vec<Constraint> = for_each_unit(&mut self.units, workers, |unit| {
            explicit::resolve_unit(program, &unit.tree, &mut unit.records, &mut unit.report)
        })?
        .into_iter()
        .flatten()
        .collect();

        let errors = explicit::settle(&mut program.write(), &constraints)?;
        self.route(errors);

        let program = &self.program;
        for_each_unit(&mut self.units, workers, |unit| {
            explicit::check_unit(program, &unit.tree, &unit.records, &mut unit.report);
            Ok(())
        })?;
        Ok(())
    }

    fn infer(&mut self) -> Result<(), CompilerError> {
        // Declarations may use each other in any unit order. Rounds with
        // their errors discarded run until one types nothing new, then a last
        // round reports against the settled table.
        let mut rounds = 1;
        loop {
            let mut typed = 0;
            for unit in &mut self.units {
                let mut discarded = Report::new();
                typed += inferred::infer_declarations(
                    &self.program,
                    &unit.tree,
                    &mut unit.records,
                    &mut discarded,
                )?
                .typed;
            }
            if typed == 0 {
                break;
            }
            rounds += 1;
        }

        let mut waiting = Vec::new();
        for unit in &mut self.units {
            let declarations = inferred::infer_declarations(
                &self.program,
                &unit.tree,
                &mut unit.records,
                &mut unit.report,
            )?;
            waiting.extend(declarations.waiting);
        }
        debug!(
            "declarations settled after {rounds} rounds, {} left waiting",
            waiting.len()
        );
        let cycles = inferred::circular(&waiting);
        self.route(cycles);

        let workers = self.workers();
        let program = &self.program;
        for_each_unit(&mut self.units, workers, |unit| {
            inferred::infer_bodies(program, &unit.tree, &mut unit.records, &mut unit.report)
        })?;
        Ok(())
    }

    /// Reports errors raised outside any unit walk against the unit they
    /// point into. Errors located in built-in code go to the first unit.
    fn route(&mut self, errors: Vec<SemanticError>) {
        for error in errors {
            let source = error.source_id();
            let index = self
                .units
                .iter()
                .position(|unit| unit.source() == source)
                .unwrap_or(0);
            if let Some(unit) = self.units.get_mut(index) {
                unit.report.add_diagnostic(error.into());
            }
        }
    }
}

/// Applies `work` to every unit on up to `workers` scoped threads. Results
/// come back in unit order; the first error in unit order wins.
fn for_each_unit<T, F>(
    units: &mut [UnitResolution],
    workers: usize,
    work: F,
) -> Result<Vec<T>, CompilerError>
where
    T: Send,
    F: Fn(&mut UnitResolution) -> Result<T, CompilerError> + Sync,
{
    if workers <= 1 || units.len() <= 1 {
        return units.iter_mut().map(&work).collect();
    }

    let chunk_size = units.len().div_ceil(workers);
    let work = &work;

    thread::scope(|scope| {
        let handles: Vec<_> = units
            .chunks_mut(chunk_size)
            .map(|chunk| {
                let first = chunk[0].source();
                let handle = scope.spawn(move || {
                    chunk
                        .iter_mut()
                        .map(work)
                        .collect::<Result<Vec<T>, CompilerError>>()
                });
                (first, handle)
            })
            .collect();

        // Join all handles before inspecting any result.
        let joined: Vec<_> = handles
            .into_iter()
            .map(|(first, handle)| {
                handle
                    .join()
                    .map_err(|_| CompilerError::WorkerPanicked(first))
            })
            .collect();

        let mut results = Vec::with_capacity(joined.len() * chunk_size);
        for chunk in joined {
            results.extend(chunk??);
        }
        Ok(results)
    })
}

#[cfg(test)]
mod tests {
    use oriel_symbols::{Category, MatchWeights, SymbolSearch};
    use oriel_tree::node::AggregateDecl;
    use proptest::prelude::*;

    use super::*;
    use crate::test::{UnitBuilder, error_codes, find_type, resolve_all};

    /// `units` sources in `demo`, each declaring `per_unit` classes.
    fn many_classes(units: u32, per_unit: u32) -> Vec<Tree> {
        (0..units)
            .map(|unit| {
                let mut builder = UnitBuilder::new(unit, "demo");
                for index in 0..per_unit {
                    builder.class(&format!("Shape{unit}x{index}"));
                }
                builder.finish()
            })
            .collect()
    }

    #[test]
    fn weights_that_tie_with_exact_matches_are_refused() {
        let workspace: Workspace = many_classes(2, 1).into_iter().collect();
        let weights = MatchWeights {
            trait_cost: 0.0,
            ..MatchWeights::default()
        };
        let result = resolve(&workspace, ResolveOptions::default().with_weights(weights));

        assert!(matches!(result, Err(CompilerError::InvalidWeights(_))));
    }

    #[test]
    fn parallel_units_share_one_module() {
        let output = resolve_all(many_classes(20, 5));

        assert!(!output.has_errors());
        assert!(output.is_complete());

        let module = output.table.module_scope("demo").unwrap();
        let scope = output.table.scope(module);
        assert_eq!(scope.symbols().len(), 100);
        for unit in 0..20 {
            for index in 0..5 {
                let name = format!("Shape{unit}x{index}");
                assert!(scope.contains(Category::Type, &name), "{name} is missing");
            }
        }
    }

    #[test]
    fn records_point_into_the_shared_table() {
        let mut unit = UnitBuilder::new(3, "demo");
        let class = unit.class("Circle");
        let tree = unit.finish();
        let output = resolve_all([tree]);

        let records = &output.unit(SourceId::new(3)).unwrap().records;
        let circle = records.symbols.copied(class).unwrap();
        assert_eq!(output.table.symbol(circle).name, "Circle");
        assert_eq!(circle, find_type(&output.table, "demo", "Circle"));
    }

    #[test]
    fn clash_between_units_is_reported_against_later_unit() {
        let mut first = UnitBuilder::new(0, "demo");
        first.class("Shape");
        let mut second = UnitBuilder::new(1, "demo");
        second.class("Shape");

        let output = resolve_all([first.finish(), second.finish()]);

        assert_eq!(output.pass, Pass::Definition);
        assert!(!output.unit(SourceId::new(0)).unwrap().report.has_errors());
        let report = &output.unit(SourceId::new(1)).unwrap().report;
        assert_eq!(report.with_code("duplicate-definition").count(), 1);
    }

    #[test]
    fn same_name_in_other_module_is_no_clash() {
        let mut first = UnitBuilder::new(0, "demo.shapes");
        first.class("Shape");
        let mut second = UnitBuilder::new(1, "demo.other");
        second.class("Shape");

        let output = resolve_all([first.finish(), second.finish()]);

        assert!(output.is_complete());
        assert_ne!(
            find_type(&output.table, "demo.shapes", "Shape"),
            find_type(&output.table, "demo.other", "Shape")
        );
    }

    #[test]
    fn failed_pass_does_not_advance() {
        let mut unit = UnitBuilder::new(0, "demo");
        unit.class("Shape");
        unit.class("Shape");
        let workspace: Workspace = [unit.finish()].into_iter().collect();

        let mut coordinator = Coordinator::new(&workspace, ResolveOptions::sequential()).unwrap();
        assert_eq!(coordinator.pass(), Pass::Definition);

        assert!(!coordinator.run_pass().unwrap());
        assert_eq!(coordinator.pass(), Pass::Definition);
        assert!(!coordinator.run_pass().unwrap());
        assert_eq!(coordinator.units()[0].report.len(), 1);
    }

    #[test]
    fn passes_run_in_order() {
        let workspace: Workspace = many_classes(2, 1).into_iter().collect();
        let mut coordinator = Coordinator::new(&workspace, ResolveOptions::default()).unwrap();

        let mut seen = Vec::new();
        while coordinator.pass() != Pass::Done {
            seen.push(coordinator.pass());
            assert!(coordinator.run_pass().unwrap());
        }

        assert_eq!(
            seen,
            [Pass::Definition, Pass::ExplicitTypes, Pass::InferredTypes]
        );
        assert!(!coordinator.run_pass().unwrap());
    }

    #[test]
    fn qualified_names_cross_modules() {
        let mut shapes = UnitBuilder::new(0, "demo.shapes");
        shapes.aggregate(AggregateDecl::class("Shape").open());
        let mut drawing = UnitBuilder::new(1, "demo.drawing");
        let base = drawing.ty("demo.shapes::Shape");
        drawing.aggregate(AggregateDecl::class("Square").with_extends(base));

        let output = resolve_all([drawing.finish(), shapes.finish()]);

        assert!(output.is_complete(), "{:?}", error_codes(&output));
        let square = find_type(&output.table, "demo.drawing", "Square");
        let shape = output
            .table
            .resolve(
                output.table.module_scope("demo.drawing").unwrap(),
                &SymbolSearch::types("demo.shapes::Shape"),
            )
            .unwrap();
        assert_eq!(output.table.aggregate(square).unwrap().super_aggregate, Some(shape));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn worker_count_does_not_change_the_outcome(workers in 1usize..9, units in 1u32..12) {
            let trees = many_classes(units, 3);
            let workspace: Workspace = trees.into_iter().collect();

            let options = ResolveOptions::default().with_max_workers(workers);
            let parallel = resolve(&workspace, options).unwrap();
            let sequential = resolve(&workspace, ResolveOptions::sequential()).unwrap();

            prop_assert_eq!(parallel.table.symbol_count(), sequential.table.symbol_count());
            for id in sequential.table.symbol_ids() {
                prop_assert_eq!(&parallel.table.symbol(id).name, &sequential.table.symbol(id).name);
            }
            prop_assert_eq!(parallel.pass, sequential.pass);
        }
    }
}
