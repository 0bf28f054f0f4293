mod handover_case1;
mod handover_case2;
