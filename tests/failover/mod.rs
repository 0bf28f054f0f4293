mod failover_case1;
