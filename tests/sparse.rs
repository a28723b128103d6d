#[cfg(test)]
mod tests {
    use ark_bls12_381::Fr;
    use ark_ff::{Field, One, Zero};
    use gatesolve::constraint::{
        Blueprint, COEFF_ID_MINUS_ONE, COEFF_ID_ONE, COEFF_ID_TWO, CommitmentConstraint,
        Instruction, SparseR1C,
    };
    use gatesolve::{CurveField, SolveError, SolverOptions, System, SystemType};

    /// `n` gates `w_{i+1} = w_i * w_i` starting from public `x`.
    fn square_chain<F: CurveField>(n: usize) -> (System<F>, u32) {
        let mut cs = System::<F>::new(SystemType::SparseR1CS);
        let x = cs.add_public_variable("x");
        let mut prev = x;
        for _ in 0..n {
            let w = cs.add_internal_variable();
            cs.add_sparse_r1c(
                SparseR1C {
                    xa: prev,
                    xb: prev,
                    xc: w,
                    qm: COEFF_ID_ONE,
                    qo: COEFF_ID_MINUS_ONE,
                    ..Default::default()
                },
                None,
            );
            prev = w;
        }
        (cs, prev)
    }

    fn check_chain<F: CurveField>() {
        let (cs, y) = square_chain::<F>(40);
        assert!(
            cs.instructions
                .iter()
                .all(|i| cs.blueprints[i.blueprint_id as usize] == Blueprint::SparseR1CMul)
        );
        let values = cs
            .solve(&[F::from(2u64)], &SolverOptions::default())
            .unwrap();
        assert_eq!(values[y as usize], F::from(2u64).pow([1u64 << 40]));
    }

    #[test]
    fn test_square_chain_bls12_381() {
        check_chain::<Fr>();
    }

    #[test]
    fn test_square_chain_bn254() {
        check_chain::<ark_bn254::Fr>();
    }

    #[test]
    fn test_lagrange_solution() {
        let (cs, y) = square_chain::<Fr>(40);
        let sol = cs
            .solve_sparse(&[Fr::from(2u64)], &SolverOptions::default())
            .unwrap();

        // 1 public row + 40 gates, padded to 64
        assert_eq!(sol.l.len(), 64);
        assert_eq!(sol.l[0], Fr::from(2u64));
        assert_eq!(sol.r[0], Fr::from(2u64));
        assert_eq!(sol.l[1], Fr::from(2u64));
        assert_eq!(sol.o[1], Fr::from(4u64));
        assert_eq!(sol.o[40], Fr::from(2u64).pow([1u64 << 40]));
        assert_eq!(sol.o[63], Fr::from(2u64));
        assert_eq!(y, 40);
    }

    #[test]
    fn test_linear_gate() {
        // z = 3x + 2y + 7
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let x = cs.add_public_variable("x");
        let y = cs.add_secret_variable("y");
        let z = cs.add_internal_variable();
        let ql = cs.coeff_id(&Fr::from(3u64));
        let qc = cs.coeff_id(&Fr::from(7u64));
        cs.add_sparse_r1c(
            SparseR1C {
                xa: x,
                xb: y,
                xc: z,
                ql,
                qr: COEFF_ID_TWO,
                qo: COEFF_ID_MINUS_ONE,
                qc,
                ..Default::default()
            },
            None,
        );
        assert_eq!(
            cs.blueprints[cs.instructions[0].blueprint_id as usize],
            Blueprint::SparseR1CAdd
        );

        let values = cs
            .solve(&[Fr::from(5u64), Fr::from(4u64)], &SolverOptions::default())
            .unwrap();
        assert_eq!(values[z as usize], Fr::from(30u64));
    }

    #[test]
    fn test_solve_for_left_wire() {
        // 2a + 3b - 20 == 0
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let b = cs.add_secret_variable("b");
        let a = cs.add_internal_variable();
        let qr = cs.coeff_id(&Fr::from(3u64));
        let qc = cs.coeff_id(&-Fr::from(20u64));
        cs.add_sparse_r1c(
            SparseR1C {
                xa: a,
                xb: b,
                ql: COEFF_ID_TWO,
                qr,
                qc,
                ..Default::default()
            },
            None,
        );

        let values = cs.solve(&[Fr::from(4u64)], &SolverOptions::default()).unwrap();
        assert_eq!(values[a as usize], Fr::from(4u64));
    }

    #[test]
    fn test_solve_for_right_wire() {
        // a * b == c with a, c known
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let a = cs.add_public_variable("a");
        let c = cs.add_public_variable("c");
        let b = cs.add_internal_variable();
        cs.add_sparse_r1c(
            SparseR1C {
                xa: a,
                xb: b,
                xc: c,
                qm: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                ..Default::default()
            },
            None,
        );
        assert_eq!(
            cs.blueprints[cs.instructions[0].blueprint_id as usize],
            Blueprint::GenericSparseR1C
        );

        let values = cs
            .solve(&[Fr::from(3u64), Fr::from(12u64)], &SolverOptions::default())
            .unwrap();
        assert_eq!(values[b as usize], Fr::from(4u64));
    }

    #[test]
    fn test_committed_gate_is_skipped() {
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let s = cs.add_secret_variable("s");
        // s + 1 == 0 does not hold, but the gate only binds a commitment
        cs.add_sparse_r1c(
            SparseR1C {
                xa: s,
                ql: COEFF_ID_ONE,
                qc: COEFF_ID_ONE,
                commitment: CommitmentConstraint::Committed,
                ..Default::default()
            },
            None,
        );
        assert!(cs.is_solved(&[Fr::from(5u64)], &SolverOptions::default()));
    }

    #[test]
    fn test_unsatisfied_gate() {
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let x = cs.add_public_variable("x");
        let y = cs.add_public_variable("y");
        cs.add_sparse_r1c(
            SparseR1C {
                xa: x,
                xb: x,
                xc: y,
                qm: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                ..Default::default()
            },
            None,
        );

        let opts = SolverOptions::default();
        assert!(cs.is_solved(&[Fr::from(3u64), Fr::from(9u64)], &opts));
        let err = cs
            .solve(&[Fr::from(3u64), Fr::from(10u64)], &opts)
            .unwrap_err();
        let SolveError::Unsatisfied(e) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(e.constraint, 0);
        assert!(
            e.reason
                .starts_with("qL⋅xa + qR⋅xb + qO⋅xc + qM⋅(xaxb) + qC != 0 → 0 + 0 + "),
            "{}",
            e.reason
        );
        assert!(e.reason.contains("(3 × 3)"), "{}", e.reason);
    }

    /// Appends `gate` under `blueprint` in its own level, bypassing blueprint
    /// selection so that a fully known gate still runs the specialized path.
    fn push_gate(cs: &mut System<Fr>, blueprint: Blueprint, gate: &SparseR1C) {
        let inst = Instruction {
            blueprint_id: cs.blueprint_id(blueprint),
            start_call_data: cs.call_data.len() as u64,
            constraint_offset: cs.nb_constraints as u32,
        };
        cs.instructions.push(inst);
        cs.call_data.extend(blueprint.compress_sparse_r1c(gate));
        cs.levels.push(vec![(cs.instructions.len() - 1) as u32]);
        cs.nb_constraints += 1;
    }

    fn unsatisfied_reason(cs: &System<Fr>, witness: &[Fr]) -> String {
        match cs.solve(witness, &SolverOptions::default()).unwrap_err() {
            SolveError::Unsatisfied(e) => {
                assert_eq!(e.constraint, 0);
                e.reason
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mul_blueprint_checks_known_output() {
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let x = cs.add_public_variable("x");
        let y = cs.add_public_variable("y");
        push_gate(
            &mut cs,
            Blueprint::SparseR1CMul,
            &SparseR1C {
                xa: x,
                xb: x,
                xc: y,
                qm: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                ..Default::default()
            },
        );

        assert!(cs.is_solved(&[Fr::from(3u64), Fr::from(9u64)], &SolverOptions::default()));
        let reason = unsatisfied_reason(&cs, &[Fr::from(3u64), Fr::from(10u64)]);
        assert!(reason.starts_with("qM⋅(xa×xb) + qO⋅xc != 0 → 9 + "), "{reason}");
    }

    #[test]
    fn test_add_blueprint_checks_known_output() {
        // x + 2y + 5 - z == 0
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let x = cs.add_public_variable("x");
        let y = cs.add_public_variable("y");
        let z = cs.add_public_variable("z");
        let qc = cs.coeff_id(&Fr::from(5u64));
        push_gate(
            &mut cs,
            Blueprint::SparseR1CAdd,
            &SparseR1C {
                xa: x,
                xb: y,
                xc: z,
                ql: COEFF_ID_ONE,
                qr: COEFF_ID_TWO,
                qo: COEFF_ID_MINUS_ONE,
                qc,
                ..Default::default()
            },
        );

        let witness = |z: u64| [Fr::from(1u64), Fr::from(2u64), Fr::from(z)];
        assert!(cs.is_solved(&witness(10), &SolverOptions::default()));
        let reason = unsatisfied_reason(&cs, &witness(11));
        assert!(
            reason.starts_with("qL⋅xa + qR⋅xb + qO⋅xc + qC != 0 → 1 + 4 + "),
            "{reason}"
        );
        assert!(reason.ends_with(" + 5 != 0"), "{reason}");
    }

    #[test]
    fn test_zero_denominator_reports_unsatisfied() {
        // a * b + 5 == 0 with b == 0 has no solution
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let b = cs.add_secret_variable("b");
        let a = cs.add_internal_variable();
        let qc = cs.coeff_id(&Fr::from(5u64));
        cs.add_sparse_r1c(
            SparseR1C {
                xa: a,
                xb: b,
                qm: COEFF_ID_ONE,
                qc,
                ..Default::default()
            },
            None,
        );

        let err = cs.solve(&[Fr::zero()], &SolverOptions::default()).unwrap_err();
        assert!(matches!(err, SolveError::Unsatisfied(_)));
        // and with b != 0 the division goes through
        let values = cs.solve(&[Fr::one()], &SolverOptions::default()).unwrap();
        assert_eq!(values[a as usize], -Fr::from(5u64));
    }

    #[test]
    #[should_panic(expected = "found more than one wire to instantiate")]
    fn test_two_unknowns_panic() {
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let a = cs.add_internal_variable();
        let b = cs.add_internal_variable();
        cs.add_sparse_r1c(
            SparseR1C {
                xa: a,
                xb: b,
                ql: COEFF_ID_ONE,
                qr: COEFF_ID_ONE,
                ..Default::default()
            },
            None,
        );
        let _ = cs.solve(&[], &SolverOptions::default());
    }

    #[test]
    fn test_mixed_gates_soundness() {
        // t = x * y, u = t + x, v = u * u - 3
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let x = cs.add_public_variable("x");
        let y = cs.add_secret_variable("y");
        let t = cs.add_internal_variable();
        let u = cs.add_internal_variable();
        let v = cs.add_internal_variable();
        let minus_three = cs.coeff_id(&-Fr::from(3u64));
        let gates = [
            SparseR1C {
                xa: x,
                xb: y,
                xc: t,
                qm: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                ..Default::default()
            },
            SparseR1C {
                xa: t,
                xb: x,
                xc: u,
                ql: COEFF_ID_ONE,
                qr: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                ..Default::default()
            },
            SparseR1C {
                xa: u,
                xb: u,
                xc: v,
                qm: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                qc: minus_three,
                ..Default::default()
            },
        ];
        for g in gates {
            cs.add_sparse_r1c(g, None);
        }
        assert_eq!(cs.levels.len(), 3);

        let values = cs
            .solve(&[Fr::from(2u64), Fr::from(5u64)], &SolverOptions::default())
            .unwrap();
        assert_eq!(values[t as usize], Fr::from(10u64));
        assert_eq!(values[u as usize], Fr::from(12u64));
        assert_eq!(values[v as usize], Fr::from(141u64));

        for g in cs.sparse_constraints() {
            let w = |i: u32| values[i as usize];
            let q = |c: u32| cs.coefficients[c as usize];
            let sum = q(g.ql) * w(g.xa)
                + q(g.qr) * w(g.xb)
                + q(g.qm) * w(g.xa) * w(g.xb)
                + q(g.qo) * w(g.xc)
                + q(g.qc);
            assert!(sum.is_zero());
        }
    }
}
