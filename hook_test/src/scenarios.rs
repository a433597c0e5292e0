mod basic;
mod chain;
mod resolve;
mod stress;

use crate::test_ctx::env_flag;

pub fn run_all() {
    run("install-unhook", basic::scenario_install_then_unhook);
    run("single", basic::scenario_single_hook_unhook);
    run("double-unhook", basic::scenario_double_unhook);
    run("returning-constant", basic::scenario_returning_constant);
    run("unloaded-target", basic::scenario_unloaded_target);
    run("records", basic::scenario_records);
    #[cfg(unix)]
    run("dump-records", basic::scenario_dump_records);
    run("multi-chain", chain::scenario_multi_chain_unhook);
    run("substitute", chain::scenario_substitute_short_circuit);
    run("replace-stack", chain::scenario_replace_stack);
    run("callback-failure", chain::scenario_callback_failure);
    run("reentrant-invoke", chain::scenario_reentrant_invoke);
    run("resolve-super", resolve::scenario_resolve_super);
    run("resolve-ambiguous", resolve::scenario_resolve_ambiguous);
    run("install-all", resolve::scenario_install_all);
    run("constructor-hook", resolve::scenario_constructor_hook);
    run(
        "concurrent-stress",
        stress::scenario_concurrent_hooking_stress,
    );
    run(
        "persistent-parallel-stress",
        stress::scenario_persistent_hook_parallel_stress,
    );
    run("perf", stress::scenario_perf_smoke);
    if env_flag("HOOK_TEST_MARATHON") {
        run("manual-churn-marathon", stress::scenario_manual_churn_marathon);
    }
}

fn run(name: &str, scenario: fn()) {
    println!("scenario: {name}");
    scenario();
}
