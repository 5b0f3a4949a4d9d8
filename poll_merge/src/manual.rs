/*!

This is the long-form manual for `poll_merge` and the `presidentielle` command line tool.

## Input files

All the files are UTF-8 CSV files with a header line.

### `candidats.csv`

The registry of candidates. Required columns: `candidate_id`, `complete_name`, `name`,
`surname`, `parti`.

|candidate_id|complete_name|name|surname|parti|
|------------|-------------|----|-------|-----|
|EM|Emmanuel Macron|Emmanuel|Macron|RE|
|MLP|Marine Le Pen|Marine|Le Pen|RN|

Each candidate can be referenced in a poll file by its complete name, by "name surname" or
by "surname name". The comparison ignores case, accents, repeated spaces and the typographic
variants of apostrophes and dashes. When two candidates share the same name, the first one
in the file is selected.

### `hypotheses.csv`

The candidate-set scenarios. Required columns: `id_hypothese`, `hypothese_complete`.
`hypothese_complete` is a comma-separated list of names.

### `polls.csv`

The index of the polls, one line per poll. Required columns: `poll_id`, `hypothese`,
`nom_institut`, `commanditaire`, `debut_enquete`, `fin_enquete`, `echantillon`, `population`,
`tour`. Optional columns: `rolling`, `media`, `filename`, `sous_echantillon1`,
`sous_echantillon2`, `sous_echantillon3`.

### `polls/<poll_id>.csv`

The results of a poll. Required columns: `candidat`, `intentions`, `erreur_sup`, `erreur_inf`.
Lines with an empty `candidat` are ignored.

## Merging

Every poll of the index is merged with its result file, in the order of the index. A poll
without result file stops the merge: no output is written.

When the candidates of a poll are not those of its hypothesis, a warning is printed. Use
`--strict-hypotheses` (or `"hypothesisMismatch": "fail"` in the configuration file) to turn
this warning into an error.

Names that are not in the registry get an id made of their initials (`Alice Dupont` becomes
`AD`). These names are listed at the end of the merge so that the registry can be completed.

## Confidence intervals

The `intervals` command computes, for each result line, the 95% confidence interval of the
voting intention and writes its bounds in `erreur_inf` and `erreur_sup`, as proportions
between 0 and 1. The sample size is the last filled `sous_echantillon` column, or `echantillon`.

## Configuration file

All the paths can be set in a JSON file passed with `--config`:

```json
{
  "rootDirectory": ".",
  "pollsDirectory": "polls",
  "outputCsv": "presidentielle2027.csv",
  "outputJson": "presidentielle2027.json",
  "hypothesisMismatch": "warn",
  "z": 1.96
}
```

`rootDirectory` is relative to the configuration file, the other paths are relative to the root.

*/
