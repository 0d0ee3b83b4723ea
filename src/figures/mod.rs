//! Report figures
//!
//! A figure is a `Figure<D, P>`: preprocessed data `D`, widget parameters
//! `P`, and a `FigureSpec` of plain functions that build the charts, draw
//! the controls and (optionally) a summary. The report holds figures as
//! `Box<dyn ReportFigure>` so the twelve variants share one list.
//!
//! Output is rebuilt only when the controls report a change, when the
//! custom protein list changes under a figure that uses it, or when there is
//! no output yet.

pub mod box_plot;
pub mod clustergram;
pub mod file_sizes;
pub mod go_enrichment;
pub mod hit_selection;
pub mod pca_scatter;
pub mod peptides_per_protein;
pub mod protein_heatmap;
pub mod protein_overlap;
pub mod scatter_matrix;
pub mod subcellular;
pub mod unique_counts;

use std::collections::BTreeSet;
use std::path::PathBuf;

use egui::{RichText, Ui};
use heck::ToSnakeCase;

use crate::chart::{plot_view, Chart};
use crate::config::Limits;
use crate::data::custom_proteins::CustomProteinSet;
use crate::data::table::DataTable;
use crate::gui::table_view;
use crate::report::downloads::{file_url, Downloads};

/// snake_case identifier used for widget keys and file names
pub fn parameterize(text: &str) -> String {
    text.to_snake_case()
}

/// Static description of a figure
#[derive(Debug, Clone, PartialEq)]
pub struct FigureMeta {
    pub title: String,
    pub short_title: String,
    pub dataset: String,
    /// Description placeholder per panel
    pub descriptions: Vec<String>,
    /// Heading per panel (may be empty)
    pub subheaders: Vec<String>,
    /// Nominal chart size (width, height) in points
    pub size: [f32; 2],
    /// Offers the "Use custom proteins" checkbox
    pub uses_custom_proteins: bool,
    /// Shows the download table under the chart
    pub inline_table: bool,
}

impl FigureMeta {
    pub fn new(title: &str, short_title: &str, dataset: &str) -> Self {
        Self {
            title: title.to_string(),
            short_title: short_title.to_string(),
            dataset: dataset.to_string(),
            descriptions: vec![String::new()],
            subheaders: Vec::new(),
            size: [750.0, 750.0],
            uses_custom_proteins: false,
            inline_table: false,
        }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.descriptions = vec![text.to_string()];
        self
    }

    /// One panel per subheader, each with its own description
    pub fn panels(mut self, panels: &[(&str, &str)]) -> Self {
        self.subheaders = panels.iter().map(|(s, _)| s.to_string()).collect();
        self.descriptions = panels.iter().map(|(_, d)| d.to_string()).collect();
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }

    pub fn custom_proteins(mut self) -> Self {
        self.uses_custom_proteins = true;
        self
    }

    pub fn inline_table(mut self) -> Self {
        self.inline_table = true;
        self
    }
}

/// What a build sees besides its own data and parameters
#[derive(Debug, Clone, Copy)]
pub struct FigureContext<'a> {
    pub limits: &'a Limits,
    /// Accessions to restrict to, when the figure opted in
    pub custom_filter: Option<&'a BTreeSet<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FigureOutput {
    pub charts: Vec<Chart>,
    /// Backing data offered as CSV
    pub table: DataTable,
    /// Replacement description placeholders; empty keeps the static ones
    pub placeholders: Vec<String>,
}

impl FigureOutput {
    /// Nothing to draw or export yet (e.g. no sample selected)
    pub fn is_blank(&self) -> bool {
        self.charts.is_empty() && self.table.is_empty()
    }

    pub fn new(charts: Vec<Chart>, table: DataTable) -> Self {
        Self {
            charts,
            table,
            placeholders: Vec::new(),
        }
    }

    pub fn table_only(table: DataTable) -> Self {
        Self::new(Vec::new(), table)
    }
}

pub type BuildFn<D, P> = fn(&D, &P, &FigureContext) -> FigureOutput;
pub type ControlsFn<D, P> = fn(&mut Ui, &mut P, &D, &FigureContext) -> bool;
pub type SummaryFn<D, P> = fn(&mut Ui, &D, &P, &FigureOutput);

pub struct FigureSpec<D, P> {
    pub build: BuildFn<D, P>,
    pub controls: ControlsFn<D, P>,
    pub summary: Option<SummaryFn<D, P>>,
}

/// Controls for figures without parameters
pub fn no_controls<D, P>(_ui: &mut Ui, _params: &mut P, _data: &D, _ctx: &FigureContext) -> bool {
    false
}

/// Start-of-window slider for paged heatmaps
pub fn window_slider(ui: &mut Ui, start: &mut usize, total: usize, page: usize, unit: &str) -> bool {
    let max = total.saturating_sub(page);
    let before = *start;
    *start = (*start).min(max);
    let changed = ui
        .add_enabled(
            max > 0,
            egui::Slider::new(start, 0..=max).text(format!("Select start of range ({} {})", page, unit)),
        )
        .changed();
    changed || before != *start
}

/// Radio buttons over a fixed set of choices
pub fn radio_choice<T: Copy + PartialEq>(
    ui: &mut Ui,
    label: &str,
    value: &mut T,
    choices: &[T],
    name: fn(&T) -> &'static str,
) -> bool {
    let mut changed = false;
    ui.label(label);
    ui.horizontal_wrapped(|ui| {
        for choice in choices {
            changed |= ui.radio_value(value, *choice, name(choice)).changed();
        }
    });
    changed
}

/// One exported page: a chart panel, or the table of a chart-less figure
#[derive(Debug, Clone, PartialEq)]
pub struct FigurePage {
    pub title: String,
    pub subheader: String,
    pub description: String,
    pub chart: Option<Chart>,
    pub table: Option<DataTable>,
    pub size: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub enum FigureEvent {
    Downloaded { figure: String, path: PathBuf },
    DownloadFailed { figure: String, error: String },
}

pub trait ReportFigure {
    fn meta(&self) -> &FigureMeta;
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);

    fn session_key(&self) -> String {
        parameterize(&self.meta().short_title)
    }

    /// Parameter widgets; marks the figure stale on change
    fn show_controls(&mut self, ui: &mut Ui, limits: &Limits, custom: &mut CustomProteinSet);
    /// Rebuild if needed; returns whether a build ran
    fn refresh(&mut self, limits: &Limits, custom: &CustomProteinSet) -> bool;
    fn output(&self) -> Option<&FigureOutput>;
    fn descriptions(&self) -> &[String];
    fn show(
        &mut self,
        ui: &mut Ui,
        limits: &Limits,
        custom: &CustomProteinSet,
        downloads: Option<&Downloads>,
    ) -> Vec<FigureEvent>;
    fn pages(&self) -> Vec<FigurePage>;
}

pub struct Figure<D, P> {
    meta: FigureMeta,
    data: D,
    params: P,
    active: bool,
    output: Option<FigureOutput>,
    descriptions: Vec<String>,
    edited: Vec<bool>,
    stale: bool,
    seen_revision: Option<u64>,
    links: Vec<PathBuf>,
    spec: FigureSpec<D, P>,
}

impl<D, P: Default> Figure<D, P> {
    /// Preprocess `input` right away; only the processed data is kept
    pub fn new<I>(meta: FigureMeta, input: I, preprocess: fn(I) -> D, spec: FigureSpec<D, P>) -> Self {
        let descriptions = meta.descriptions.clone();
        let edited = vec![false; descriptions.len()];
        Self {
            data: preprocess(input),
            params: P::default(),
            active: true,
            output: None,
            descriptions,
            edited,
            stale: true,
            seen_revision: None,
            links: Vec::new(),
            meta,
            spec,
        }
    }
}

impl<D, P> Figure<D, P> {
    pub fn with_params(mut self, params: P) -> Self {
        self.params = params;
        self.stale = true;
        self
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut P {
        self.stale = true;
        &mut self.params
    }

    fn context<'a>(&self, limits: &'a Limits, custom: &'a CustomProteinSet) -> FigureContext<'a> {
        let custom_filter = if self.meta.uses_custom_proteins {
            custom.filter_for(&parameterize(&self.meta.short_title))
        } else {
            None
        };
        FigureContext {
            limits,
            custom_filter,
        }
    }

    fn apply_placeholders(&mut self) {
        let Some(output) = &self.output else { return };
        for (i, placeholder) in output.placeholders.iter().enumerate() {
            if i >= self.descriptions.len() {
                self.descriptions.push(placeholder.clone());
                self.edited.push(false);
            } else if !self.edited[i] {
                self.descriptions[i] = placeholder.clone();
            }
        }
    }
}

impl<D, P> ReportFigure for Figure<D, P> {
    fn meta(&self) -> &FigureMeta {
        &self.meta
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        if active != self.active {
            log::debug!("Figure '{}' active: {}", self.meta.short_title, active);
        }
        self.active = active;
    }

    fn show_controls(&mut self, ui: &mut Ui, limits: &Limits, custom: &mut CustomProteinSet) {
        if !self.active {
            return;
        }
        let key = self.session_key();
        if self.meta.uses_custom_proteins && !custom.is_empty() {
            let mut use_custom = custom.use_for(&key);
            if ui.checkbox(&mut use_custom, "Use custom proteins").changed() {
                custom.set_use_for(&key, use_custom);
                self.stale = true;
            }
        }
        let ctx = self.context(limits, custom);
        if (self.spec.controls)(ui, &mut self.params, &self.data, &ctx) {
            self.stale = true;
        }
    }

    fn refresh(&mut self, limits: &Limits, custom: &CustomProteinSet) -> bool {
        if !self.active {
            return false;
        }
        let revision_changed =
            self.meta.uses_custom_proteins && self.seen_revision != Some(custom.revision());
        if !(self.stale || self.output.is_none() || revision_changed) {
            return false;
        }
        let ctx = self.context(limits, custom);
        self.output = Some((self.spec.build)(&self.data, &self.params, &ctx));
        self.seen_revision = Some(custom.revision());
        self.stale = false;
        self.apply_placeholders();
        log::debug!("Rebuilt figure '{}'", self.meta.short_title);
        true
    }

    fn output(&self) -> Option<&FigureOutput> {
        self.output.as_ref()
    }

    fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    fn show(
        &mut self,
        ui: &mut Ui,
        limits: &Limits,
        custom: &CustomProteinSet,
        downloads: Option<&Downloads>,
    ) -> Vec<FigureEvent> {
        let mut events = Vec::new();
        if !self.active {
            return events;
        }
        self.refresh(limits, custom);
        let Some(output) = self.output.take() else {
            return events;
        };
        let key = self.session_key();

        ui.heading(&self.meta.title);
        if output.is_blank() {
            ui.label("Adjust the selection in the sidebar to compute this figure.");
            ui.separator();
            self.output = Some(output);
            return events;
        }
        let panels = output.charts.len().max(self.meta.subheaders.len()).max(1);
        for i in 0..panels {
            if let Some(sub) = self.meta.subheaders.get(i).filter(|s| !s.is_empty()) {
                ui.label(RichText::new(sub).size(15.0).strong());
            }
            if let Some(chart) = output.charts.get(i) {
                plot_view::show_chart(ui, &format!("{}_{}", key, i), chart, self.meta.size);
            }
            if let Some(text) = self.descriptions.get_mut(i) {
                let response = ui.add(
                    egui::TextEdit::multiline(text)
                        .hint_text("Description")
                        .desired_width(f32::INFINITY)
                        .desired_rows(3),
                );
                if response.changed() {
                    self.edited[i] = true;
                }
            }
            if let (Some(chart), Some(downloads)) = (output.charts.get(i), downloads) {
                if ui.button("Download .svg").clicked() {
                    let (w, h) = (self.meta.size[0], self.meta.size[1]);
                    events.push(match downloads.write_svg(chart, w, h) {
                        Ok(path) => {
                            self.links.push(path.clone());
                            FigureEvent::Downloaded { figure: key.clone(), path }
                        }
                        Err(e) => FigureEvent::DownloadFailed {
                            figure: key.clone(),
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        if self.meta.inline_table || output.charts.is_empty() {
            table_view::show_table(ui, &format!("{}_table", key), &output.table, 300.0);
        }
        if let Some(summary) = self.spec.summary {
            summary(ui, &self.data, &self.params, &output);
        }

        if let Some(downloads) = downloads {
            if ui.button("Download as .csv").clicked() {
                events.push(match downloads.write_table(&output.table) {
                    Ok(path) => {
                        self.links.push(path.clone());
                        FigureEvent::Downloaded { figure: key.clone(), path }
                    }
                    Err(e) => FigureEvent::DownloadFailed {
                        figure: key.clone(),
                        error: e.to_string(),
                    },
                });
            }
        }
        for path in &self.links {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.hyperlink_to(format!("📄 {}", name), file_url(path));
        }
        ui.separator();
        self.output = Some(output);
        events
    }

    fn pages(&self) -> Vec<FigurePage> {
        let Some(output) = self.output.as_ref().filter(|o| !o.is_blank()) else {
            return Vec::new();
        };
        let page = |i: usize, chart: Option<&Chart>, table: Option<&DataTable>| FigurePage {
            title: self.meta.title.clone(),
            subheader: self.meta.subheaders.get(i).cloned().unwrap_or_default(),
            description: self.descriptions.get(i).cloned().unwrap_or_default(),
            chart: chart.cloned(),
            table: table.cloned(),
            size: self.meta.size,
        };
        if output.charts.is_empty() {
            return vec![page(0, None, Some(&output.table))];
        }
        output
            .charts
            .iter()
            .enumerate()
            .map(|(i, c)| page(i, Some(c), None))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::custom_proteins::UploadedFile;
    use crate::data::table::Cell;

    fn count_rows(data: &Vec<f64>, params: &usize, ctx: &FigureContext) -> FigureOutput {
        let n = match ctx.custom_filter {
            Some(f) => f.len(),
            None => data.len() * *params.max(&1),
        };
        FigureOutput::table_only(DataTable::new(
            vec!["n".into()],
            vec![vec![Cell::number(n as f64)]],
        ))
    }

    fn figure(custom: bool) -> Figure<Vec<f64>, usize> {
        let mut meta = FigureMeta::new("Counting", "Count Figure", "ds").description("rows");
        if custom {
            meta = meta.custom_proteins();
        }
        Figure::new(
            meta,
            vec![1.0, f64::NAN, 3.0],
            |v: Vec<f64>| v.into_iter().filter(|x| x.is_finite()).collect(),
            FigureSpec {
                build: count_rows,
                controls: no_controls,
                summary: None,
            },
        )
    }

    #[test]
    fn test_parameterize() {
        assert_eq!(parameterize("Peptide Intensity Box Plot"), "peptide_intensity_box_plot");
        assert_eq!(parameterize("  PCA / Scatter (3D)!"), "pca_scatter_3d");
        assert_eq!(parameterize("# Unique Peptides and Proteins"), "unique_peptides_and_proteins");
        assert_eq!(figure(false).session_key(), "count_figure");
    }

    #[test]
    fn test_figure_preprocesses_once_and_builds_on_demand() {
        let limits = Limits::default();
        let custom = CustomProteinSet::default();
        let mut fig = figure(false);
        assert_eq!(fig.data(), &vec![1.0, 3.0]);
        assert!(fig.output().is_none());

        assert!(fig.refresh(&limits, &custom));
        assert!(!fig.refresh(&limits, &custom));
        assert_eq!(fig.output().unwrap().table.rows[0][0], Cell::Number(2.0));

        *fig.params_mut() = 5;
        assert!(fig.refresh(&limits, &custom));
        assert_eq!(fig.output().unwrap().table.rows[0][0], Cell::Number(10.0));
    }

    #[test]
    fn test_inactive_figures_build_nothing() {
        let mut fig = figure(false);
        fig.set_active(false);
        assert!(!fig.refresh(&Limits::default(), &CustomProteinSet::default()));
        assert!(fig.output().is_none());
        assert!(fig.pages().is_empty());
    }

    #[test]
    fn test_custom_revision_triggers_rebuild() {
        let limits = Limits::default();
        let mut custom = CustomProteinSet::default();
        let mut fig = figure(true);
        assert!(fig.refresh(&limits, &custom));
        assert!(!fig.refresh(&limits, &custom));

        let upload = UploadedFile::from_bytes("list.csv", b"Protein\nsp|P1|A_HUMAN\nP2\n").unwrap();
        custom.rebuild(&[upload]);
        assert!(fig.refresh(&limits, &custom));
        assert_eq!(fig.output().unwrap().table.rows[0][0], Cell::Number(2.0));

        // a figure without the custom flag ignores list changes
        let mut plain = figure(false);
        plain.refresh(&limits, &custom);
        custom.rebuild(&[]);
        assert!(!plain.refresh(&limits, &custom));
    }

    #[test]
    fn test_table_only_figure_exports_one_table_page() {
        let mut fig = figure(false);
        fig.refresh(&Limits::default(), &CustomProteinSet::default());
        let pages = fig.pages();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].chart.is_none());
        assert_eq!(pages[0].description, "rows");
        assert!(pages[0].table.is_some());
    }
}
