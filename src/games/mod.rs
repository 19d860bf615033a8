pub mod eriantys;
