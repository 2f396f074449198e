// Copyright 2025 eraflo
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

//! Built-in example cases.

use shaderbench_core::BenchmarkCase;

/// Three cases that bracket the usual cost drivers: an unlit baseline, a lit
/// grid with instancing, and a smaller lit grid without instancing but with shadows.
pub fn example_cases() -> Vec<BenchmarkCase> {
    vec![
        BenchmarkCase {
            name: "Baseline Unlit (Instancing ON, No Shadows)".to_string(),
            grid_x: 40,
            grid_y: 40,
            spacing: 1.0,
            gpu_instancing: true,
            cast_shadows: false,
            receive_shadows: false,
            ..Default::default()
        },
        BenchmarkCase {
            name: "URP/Lit (Instancing ON, Shadows OFF)".to_string(),
            grid_x: 50,
            grid_y: 50,
            spacing: 1.0,
            gpu_instancing: true,
            cast_shadows: false,
            receive_shadows: false,
            ..Default::default()
        },
        BenchmarkCase {
            name: "URP/Lit (Instancing OFF, Shadows ON)".to_string(),
            grid_x: 35,
            grid_y: 35,
            spacing: 1.0,
            gpu_instancing: false,
            cast_shadows: true,
            receive_shadows: true,
            ..Default::default()
        },
    ]
}
