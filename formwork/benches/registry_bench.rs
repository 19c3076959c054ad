use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use formwork::builder::DeclareValueHosts;
use formwork::config::{
    ConditionConfig, ConfigMerger, ValidatorConfig, ValueHostConfig, ValueHostConfigMergeService, ValueHostType,
};
use formwork::services::{create_builder, ValidationServices};
use formwork::value_host::SetValueOptions;
use formwork::{UiLayerOptions, ValueHostsManager};
use serde_json::json;
use std::rc::Rc;

fn input_config(name: &str) -> ValueHostConfig {
    ValueHostConfig::new(name, ValueHostType::Input)
        .with_data_type("String")
        .with_validator(ValidatorConfig::new(ConditionConfig::new("RequireText")).with_error_message("Required"))
        .with_validator(ValidatorConfig::new(ConditionConfig::new("Regex")))
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let merger = ConfigMerger::new();
    let base = input_config("email");
    let source = ValueHostConfig::new("email", ValueHostType::Input)
        .with_label("Email")
        .with_validator(ValidatorConfig::new(ConditionConfig::new("Regex")).with_error_message("Bad email"));

    group.bench_function("single_config", |b| {
        b.iter(|| {
            let mut target = base.clone();
            merger.merge(black_box(&source), &mut target);
            target
        });
    });

    group.finish();
}

fn bench_builder_complete(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder_complete");
    let services = Rc::new(ValidationServices::new());

    for size in [10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut builder = create_builder(&services);
                for i in 0..size {
                    builder.apply_config(input_config(&format!("field{i}"))).unwrap();
                }
                builder.start_ui_layer_config(UiLayerOptions::default()).unwrap();
                for i in (0..size).step_by(2) {
                    builder
                        .apply_config(ValueHostConfig::new(format!("field{i}"), ValueHostType::Input).with_label("UI"))
                        .unwrap();
                }
                builder.complete().unwrap()
            });
        });
    }

    group.finish();
}

fn bench_manager(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager");
    let services = Rc::new(ValidationServices::new());
    let mut builder = create_builder(&services);
    for i in 0..100 {
        builder.static_host(format!("field{i}")).unwrap();
    }
    let config = builder.complete().unwrap();

    group.bench_function("construct_100", |b| {
        b.iter(|| ValueHostsManager::new(black_box(config.clone())).unwrap());
    });

    let manager = ValueHostsManager::new(config.clone()).unwrap();
    group.bench_function("set_value", |b| {
        let host = manager.get_value_host("field50").unwrap().unwrap();
        let mut n = 0_u64;
        b.iter(|| {
            n += 1;
            host.set_value(Some(json!(n)), SetValueOptions::default()).unwrap();
        });
    });

    group.bench_function("rebuild_with_merge", |b| {
        let patch = ValueHostConfig::new("field10", ValueHostType::Static).with_label("Ten");
        b.iter(|| manager.add_or_merge_value_host(black_box(&patch), None).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_merge, bench_builder_complete, bench_manager);
criterion_main!(benches);
