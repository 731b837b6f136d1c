use super::*;

qc!(op_sequences_match_the_naive_table, _op_sequences);
fn _op_sequences(ops: Vec<Operation>) -> bool {
    let runtime = TrieRuntime::new(5);
    let mut table = RadixTable::new(&runtime, 8);
    let mut model = NaiveTable::default();

    for op in &ops {
        match *op {
            Operation::Add(net) => {
                let inserted = model.add(net);
                let result = table.add_route(
                    address_key(net.masked()),
                    Some(&plen_key(net.1)),
                    NodeTwin::new(),
                );
                match (inserted, result) {
                    (true, Ok(_)) => {}
                    (false, Err(e)) if e.kind == RadixError::DuplicateRoute => {}
                    _ => return false,
                }
            }
            Operation::Remove(net) => {
                let removed = model.remove(net);
                let result = table.remove_route(&address_key(net.masked()), Some(&plen_key(net.1)));
                match (removed, result) {
                    (true, Ok(twin)) => {
                        if twin.key() != Some(&address_key(net.masked())) {
                            return false;
                        }
                    }
                    (false, Err(RadixError::NotFound)) => {}
                    _ => return false,
                }
            }
        }
        if table.len() != model.routes.len() {
            return false;
        }
    }

    // Every lookup agrees with the linear scan, probing each route's
    // network address plus addresses just inside and outside of it.
    for &(net, plen) in &model.routes {
        let inside = net | (!plen_mask(plen) & 0x0101_0101);
        let outside = net ^ 0x8000_0000;
        for probe in [net, inside, outside, net.wrapping_add(1)] {
            if table
                .best_match(&address_key(probe))
                .map(|l| leaf_entry(&table, l))
                != model.best(probe)
            {
                return false;
            }
        }
    }

    // Exact lookups find exactly the stored pair.
    for &(net, plen) in &model.routes {
        match table.exact_match(&address_key(net), Some(&plen_key(plen))) {
            Some(leaf) => {
                if leaf_entry(&table, leaf) != (net, plen) {
                    return false;
                }
            }
            None => return false,
        }
    }

    // The iterator yields every stored route exactly once.
    let mut walked: Vec<_> = table.iter().map(|l| leaf_entry(&table, l)).collect();
    let mut expected = model.routes.clone();
    walked.sort_unstable();
    expected.sort_unstable();
    walked == expected
}

qc!(clear_after_ops_leaves_nothing, _clear_after_ops);
fn _clear_after_ops(nets: Vec<TestNet>) -> bool {
    let runtime = TrieRuntime::new(5);
    let mut table = RadixTable::new(&runtime, 8);
    for net in &nets {
        let _ = table.add_route(
            address_key(net.masked()),
            Some(&plen_key(net.1)),
            NodeTwin::new(),
        );
    }
    table.clear();
    table.is_empty() && table.iter().next().is_none()
}

qc!(removal_reverts_insertion, _removal_reverts);
fn _removal_reverts((nets, extra): (Vec<TestNet>, TestNet)) -> bool {
    let runtime = TrieRuntime::new(5);
    let mut table = RadixTable::new(&runtime, 8);
    let mut model = NaiveTable::default();
    for net in &nets {
        if model.add(*net)
            && table
                .add_route(
                    address_key(net.masked()),
                    Some(&plen_key(net.1)),
                    NodeTwin::new(),
                )
                .is_err()
        {
            return false;
        }
    }

    // Adding and immediately removing one more route must not disturb any
    // other lookup result.
    let probes: Vec<u32> = model
        .routes
        .iter()
        .flat_map(|&(net, _)| [net, net | 1, net | 0x0001_0100])
        .collect();
    let before: Vec<_> = probes
        .iter()
        .map(|&p| {
            table
                .best_match(&address_key(p))
                .map(|l| leaf_entry(&table, l))
        })
        .collect();

    let fresh = !model.routes.contains(&(extra.masked(), extra.1));
    let added = table
        .add_route(
            address_key(extra.masked()),
            Some(&plen_key(extra.1)),
            NodeTwin::new(),
        )
        .is_ok();
    if added != fresh {
        return false;
    }
    if added
        && table
            .remove_route(&address_key(extra.masked()), Some(&plen_key(extra.1)))
            .is_err()
    {
        return false;
    }

    let after: Vec<_> = probes
        .iter()
        .map(|&p| {
            table
                .best_match(&address_key(p))
                .map(|l| leaf_entry(&table, l))
        })
        .collect();
    before == after
}
