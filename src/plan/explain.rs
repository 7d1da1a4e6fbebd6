// Copyright 2026 The Query Optimizer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `explain()` tree rendering (spec §4.A, §6 "each plan node carries...
//! a human-readable `explain()` string"). No specific textual format is
//! guaranteed stable (spec §1 Non-goals: "generating an EXPLAIN textual
//! dump in any specific format"); this generalizes the teacher's per-node
//! `Distill`/`fmt_with_name` convention (`generic/top_n.rs`,
//! `logical_now.rs`) into one shared entry point so every variant renders
//! consistently instead of each implementing its own `fmt::Debug`.

use pretty_xmlish::{Pretty, PrettyConfig, XmlNode};

use crate::expr::display::derive_name;

use super::logical::{LogicalPlan, SortDirection};
use super::physical::PhysicalPlan;

fn render(node: XmlNode<'_>) -> String {
    let mut config = PrettyConfig {
        indent: 2,
        need_to_pad: true,
        unicode: true,
        width: 120,
    };
    let mut out = String::new();
    config.unicode(true);
    config.render_fmt(&node, &mut out);
    out
}

fn sort_items_text(items: &[super::logical::SortItem]) -> String {
    items
        .iter()
        .map(|item| {
            let dir = match item.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            format!("{} {}", derive_name(&item.expr), dir)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn explain(plan: &LogicalPlan) -> String {
    render(distill_logical(plan))
}

fn distill_logical<'a>(plan: &LogicalPlan) -> XmlNode<'a> {
    let children: Vec<XmlNode<'a>> = plan.children().into_iter().map(distill_logical).collect();
    match plan {
        LogicalPlan::DataSource(n) => XmlNode::simple_record(
            "DataSource",
            vec![
                ("table", Pretty::text(n.table.name.clone())),
                (
                    "pushed_filters",
                    Pretty::text(
                        n.pushed_filters
                            .iter()
                            .map(derive_name)
                            .collect::<Vec<_>>()
                            .join(" AND "),
                    ),
                ),
                (
                    "chosen_index",
                    Pretty::text(n.chosen_index.clone().unwrap_or_default()),
                ),
            ],
            children,
        ),
        LogicalPlan::Selection(n) => XmlNode::simple_record(
            "Selection",
            vec![("condition", Pretty::text(derive_name(&n.condition.to_expr())))],
            children,
        ),
        LogicalPlan::Projection(n) => XmlNode::simple_record(
            "Projection",
            vec![(
                "exprs",
                Pretty::text(
                    n.items
                        .iter()
                        .map(|i| i.name())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            )],
            children,
        ),
        LogicalPlan::Join(n) => XmlNode::simple_record(
            "Join",
            vec![
                ("type", Pretty::text(format!("{:?}", n.kind))),
                ("on", Pretty::text(derive_name(&n.condition.to_expr()))),
            ],
            children,
        ),
        LogicalPlan::Apply(n) => XmlNode::simple_record(
            "Apply",
            vec![
                ("type", Pretty::text(format!("{:?}", n.kind))),
                ("correlated", Pretty::text(format!("{}", n.correlated_columns.len()))),
            ],
            children,
        ),
        LogicalPlan::Aggregate(n) => XmlNode::simple_record(
            "Aggregate",
            vec![
                (
                    "group_by",
                    Pretty::text(n.group_by.iter().map(derive_name).collect::<Vec<_>>().join(", ")),
                ),
                (
                    "aggs",
                    Pretty::text(n.items.iter().map(|i| i.name()).collect::<Vec<_>>().join(", ")),
                ),
            ],
            children,
        ),
        LogicalPlan::Sort(n) => {
            XmlNode::simple_record("Sort", vec![("order", Pretty::text(sort_items_text(&n.items)))], children)
        }
        LogicalPlan::TopN(n) => XmlNode::simple_record(
            "TopN",
            vec![
                ("order", Pretty::text(sort_items_text(&n.items))),
                ("limit", Pretty::text(n.limit.to_string())),
                ("offset", Pretty::text(n.offset.to_string())),
            ],
            children,
        ),
        LogicalPlan::Limit(n) => XmlNode::simple_record(
            "Limit",
            vec![
                ("limit", Pretty::text(n.limit.to_string())),
                ("offset", Pretty::text(n.offset.to_string())),
            ],
            children,
        ),
        LogicalPlan::Window(n) => XmlNode::simple_record(
            "Window",
            vec![(
                "funcs",
                Pretty::text(n.items.iter().map(|i| i.name()).collect::<Vec<_>>().join(", ")),
            )],
            children,
        ),
        LogicalPlan::SetOp(n) => {
            XmlNode::simple_record(&format!("{:?}", n.kind), vec![], children)
        }
        LogicalPlan::Dml(n) => XmlNode::simple_record(
            &format!("{:?}", n.kind),
            vec![("target", Pretty::text(n.target.name.clone()))],
            children,
        ),
    }
}

pub fn explain_physical(plan: &PhysicalPlan) -> String {
    render(distill_physical(plan))
}

fn distill_physical<'a>(plan: &PhysicalPlan) -> XmlNode<'a> {
    let children: Vec<XmlNode<'a>> = plan.children().into_iter().map(distill_physical).collect();
    let common = vec![
        ("rows", Pretty::text(plan.rows().to_string())),
        ("cost", Pretty::text(format!("{:.3}", plan.cost().0))),
    ];
    match plan {
        PhysicalPlan::Scan(n) => {
            let mut fields = vec![("table", Pretty::text(n.table.name.clone()))];
            fields.extend(common);
            XmlNode::simple_record("Scan", fields, children)
        }
        PhysicalPlan::Filter(_) => XmlNode::simple_record("Filter", common, children),
        PhysicalPlan::Project(_) => XmlNode::simple_record("Project", common, children),
        PhysicalPlan::Join(n) => {
            let mut fields = vec![("algo", Pretty::text(format!("{:?}", n.algo)))];
            fields.extend(common);
            XmlNode::simple_record("Join", fields, children)
        }
        PhysicalPlan::Aggregate(n) => {
            let mut fields = vec![("algo", Pretty::text(n.algorithm.label()))];
            fields.extend(common);
            XmlNode::simple_record("Aggregate", fields, children)
        }
        PhysicalPlan::Sort(_) => XmlNode::simple_record("Sort", common, children),
        PhysicalPlan::TopN(_) => XmlNode::simple_record("TopN", common, children),
        PhysicalPlan::Limit(_) => XmlNode::simple_record("Limit", common, children),
        PhysicalPlan::Window(_) => XmlNode::simple_record("Window", common, children),
        PhysicalPlan::SetOp(_) => XmlNode::simple_record("SetOp", common, children),
        PhysicalPlan::Dml(n) => {
            XmlNode::simple_record(&format!("{:?}", n.kind), vec![], children)
        }
    }
}
